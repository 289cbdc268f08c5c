//! Slide renderer: turns slide descriptions into document primitives

use crate::error::{Error, Result};
use crate::render::document::{
    Align, ChartSpec, DeckDocument, Fill, Paragraph, Rect, SlideId, SlideKind, TextBlock,
    TextStyle,
};
use crate::render::image::ImageAsset;
use crate::render::theme::{Rgb, StyleBundle};
use crate::types::{ChartData, SlideConfig, SlideType, StatisticData};
use crate::utils::truncate_chars;
use std::path::Path;
use tracing::{debug, info, warn};

/// Most statistics a single slide shows
pub const MAX_STATISTICS: usize = 4;

/// Gradient direction applied to backgrounds (top to bottom)
pub const GRADIENT_ANGLE: f64 = 270.0;

/// Render path chosen for a synthesized slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Large figures with labels
    Statistics,
    /// Picture covering the canvas
    FullscreenImage,
    /// Native chart
    Chart,
    /// Title and bullets, optionally with a side picture
    Content,
}

/// Pick the layout for a slide.
///
/// Depends only on the slide type, whether statistics are present, whether
/// an image was fetched and whether chart data is present. Any mismatch
/// between the type and its data falls through to [`Layout::Content`].
pub fn select_layout(slide: &SlideConfig, image_fetched: bool) -> Layout {
    match slide.slide_type {
        SlideType::Statistics if !slide.statistics().is_empty() => Layout::Statistics,
        SlideType::Image if image_fetched => Layout::FullscreenImage,
        SlideType::Chart if slide.chart_data.is_some() => Layout::Chart,
        _ => Layout::Content,
    }
}

/// Renders styled slides into one document
#[derive(Debug)]
pub struct SlideRenderer {
    document: Box<dyn DeckDocument>,
    style: StyleBundle,
}

impl SlideRenderer {
    /// Create a renderer over a fresh document with a resolved style
    pub fn new(document: Box<dyn DeckDocument>, style: StyleBundle) -> Self {
        info!("Applied theme: {}", style.name);
        Self { document, style }
    }

    /// Style applied to every slide
    pub fn style(&self) -> &StyleBundle {
        &self.style
    }

    /// Slides rendered so far
    pub fn slide_count(&self) -> usize {
        self.document.slide_count()
    }

    fn text_style(&self, size_pt: f64, bold: bool, color: Rgb) -> TextStyle {
        TextStyle {
            font: self.style.font_name.clone(),
            size_pt,
            bold,
            color,
        }
    }

    fn title_text(&self, text: &str, size_pt: f64) -> TextBlock {
        TextBlock::line(text, self.text_style(size_pt, true, self.style.title_color))
    }

    fn bullet_block(&self, bullets: &[String], size_pt: f64) -> TextBlock {
        TextBlock {
            paragraphs: bullets.iter().map(|b| Paragraph::bullet(b)).collect(),
            style: self.text_style(size_pt, false, self.style.text_color),
            align: Align::Left,
            wrap: true,
        }
    }

    fn apply_background(&mut self, slide: SlideId) -> Result<()> {
        if self.style.gradient {
            if let Some(end) = self.style.gradient_end {
                let gradient = Fill::Gradient {
                    start: self.style.bg_color,
                    end,
                    angle: GRADIENT_ANGLE,
                };
                match self.document.set_background(slide, &gradient) {
                    Ok(()) => return Ok(()),
                    Err(e) => debug!("Gradient fallback: {}", e),
                }
            }
        }
        self.document.set_background(
            slide,
            &Fill::Solid {
                color: self.style.bg_color,
            },
        )
    }

    fn decoration_line(&mut self, slide: SlideId, x: f64, y: f64) -> Result<()> {
        if !self.style.decoration_line {
            return Ok(());
        }
        self.document
            .add_rectangle(slide, Rect::inches(x, y, 2.0, 0.05), self.style.accent_color)
    }

    fn notes(&mut self, slide: SlideId, notes: Option<&str>) -> Result<()> {
        match notes.map(str::trim).filter(|n| !n.is_empty()) {
            Some(notes) => self.document.set_notes(slide, notes),
            None => Ok(()),
        }
    }

    // A slide that fails half-way is removed so the deck never keeps a
    // partially drawn slide.
    fn build<F>(&mut self, kind: SlideKind, fill: F) -> Result<SlideId>
    where
        F: FnOnce(&mut Self, SlideId) -> Result<()>,
    {
        let slide = self.document.add_slide(kind)?;
        let outcome = self
            .apply_background(slide)
            .and_then(|()| fill(self, slide));
        if let Err(e) = outcome {
            if let Err(discard) = self.document.discard_slide(slide) {
                warn!("Could not discard partial {:?} slide: {}", kind, discard);
            }
            return Err(e);
        }
        Ok(slide)
    }

    /// Deck title with a subtitle
    pub fn add_title_slide(&mut self, title: &str, subtitle: &str) -> Result<SlideId> {
        self.build(SlideKind::Title, |r, slide| {
            let heading = r.title_text(title, 44.0).aligned(Align::Center);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 2.0, 9.0, 1.4), &heading)?;
            r.decoration_line(slide, 4.0, 3.5)?;
            if !subtitle.is_empty() {
                let sub = TextBlock::line(subtitle, r.text_style(24.0, false, r.style.text_color))
                    .aligned(Align::Center);
                r.document
                    .add_text_box(slide, Rect::inches(1.0, 3.8, 8.0, 1.0), &sub)?;
            }
            Ok(())
        })
    }

    /// Section divider
    pub fn add_section_header(&mut self, title: &str) -> Result<SlideId> {
        self.build(SlideKind::SectionHeader, |r, slide| {
            let heading = r.title_text(title, 40.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 2.5, 9.0, 1.25), &heading)?;
            r.decoration_line(slide, 0.5, 3.85)
        })
    }

    /// Title and bullets; an image narrows the text column and sits on the right
    pub fn add_content_slide(
        &mut self,
        title: &str,
        bullets: &[String],
        notes: Option<&str>,
        image: Option<&ImageAsset>,
    ) -> Result<SlideId> {
        self.content_slide(SlideKind::Content, title, bullets, notes, image)
    }

    fn content_slide(
        &mut self,
        kind: SlideKind,
        title: &str,
        bullets: &[String],
        notes: Option<&str>,
        image: Option<&ImageAsset>,
    ) -> Result<SlideId> {
        self.build(kind, |r, slide| {
            let heading = r.title_text(title, 32.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 0.4, 9.0, 1.0), &heading)?;
            let body_width = if image.is_some() { 5.5 } else { 9.0 };
            let body = r.bullet_block(bullets, 20.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 1.5, body_width, 5.5), &body)?;
            if let Some(image) = image {
                let frame = image.fit_within(Rect::inches(6.0, 1.5, 3.6, 5.0));
                r.document.add_picture(slide, image, frame)?;
            }
            r.notes(slide, notes)
        })
    }

    /// Native chart; mismatched data is rejected before anything is drawn
    pub fn add_chart_slide(
        &mut self,
        title: &str,
        chart: &ChartData,
        notes: Option<&str>,
    ) -> Result<SlideId> {
        chart.validate()?;
        let spec = ChartSpec {
            kind: chart.chart_type.into(),
            title: chart.title.clone(),
            categories: chart.categories.clone(),
            series_name: chart.series_name.clone(),
            values: chart.values.clone(),
        };
        let slide = self.build(SlideKind::Chart, |r, slide| {
            let heading = r.title_text(title, 28.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 0.3, 9.0, 0.8), &heading)?;
            r.document
                .add_chart(slide, &spec, Rect::inches(1.0, 1.5, 8.0, 5.0))?;
            r.notes(slide, notes)
        })?;
        info!("Added {:?} chart: {}", chart.chart_type, chart.title);
        Ok(slide)
    }

    /// Up to four headline figures spread across the slide
    pub fn add_statistics_slide(
        &mut self,
        title: &str,
        stats: &[StatisticData],
        notes: Option<&str>,
    ) -> Result<SlideId> {
        let shown = &stats[..stats.len().min(MAX_STATISTICS)];
        if stats.len() > MAX_STATISTICS {
            debug!("Dropping {} statistics beyond {}", stats.len() - MAX_STATISTICS, MAX_STATISTICS);
        }
        self.build(SlideKind::Statistics, |r, slide| {
            let heading = r.title_text(title, 32.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 0.3, 9.0, 0.8), &heading)?;
            if !shown.is_empty() {
                let spacing = 9.0 / shown.len() as f64;
                let start_x = 0.5 + (spacing - 2.0) / 2.0;
                for (i, stat) in shown.iter().enumerate() {
                    let x = start_x + i as f64 * spacing;
                    let value = TextBlock::line(
                        stat.value.as_str(),
                        r.text_style(54.0, true, r.style.accent_color),
                    )
                    .aligned(Align::Center);
                    r.document
                        .add_text_box(slide, Rect::inches(x, 2.5, 2.0, 1.5), &value)?;
                    let label = TextBlock::line(
                        stat.label.as_str(),
                        r.text_style(16.0, false, r.style.text_color),
                    )
                    .aligned(Align::Center);
                    r.document
                        .add_text_box(slide, Rect::inches(x, 4.2, 2.0, 0.8), &label)?;
                }
            }
            r.notes(slide, notes)
        })
    }

    /// Picture covering the canvas with optional overlay title and caption
    pub fn add_fullscreen_image_slide(
        &mut self,
        image: &ImageAsset,
        caption: Option<&str>,
        overlay_title: Option<&str>,
        notes: Option<&str>,
    ) -> Result<SlideId> {
        self.build(SlideKind::FullscreenImage, |r, slide| {
            let size = r.document.slide_size();
            let canvas = Rect {
                x: 0,
                y: 0,
                cx: size.cx,
                cy: size.cy,
            };
            r.document.add_picture(slide, image, canvas)?;
            if let Some(title) = overlay_title.filter(|t| !t.is_empty()) {
                let block = TextBlock::line(title, r.text_style(48.0, true, Rgb::WHITE));
                r.document
                    .add_text_box(slide, Rect::inches(0.5, 3.0, 9.0, 1.5), &block)?;
            }
            if let Some(caption) = caption.filter(|c| !c.is_empty()) {
                let block =
                    TextBlock::line(caption, r.text_style(14.0, false, Rgb(220, 220, 220)));
                r.document
                    .add_text_box(slide, Rect::inches(0.5, 6.5, 9.0, 0.5), &block)?;
            }
            r.notes(slide, notes)
        })
    }

    /// Reference list; nothing is added for an empty list
    pub fn add_citations_slide(&mut self, citations: &[String]) -> Result<Option<SlideId>> {
        if citations.is_empty() {
            return Ok(None);
        }
        let slide = self.build(SlideKind::References, |r, slide| {
            let heading = r.title_text("References", 32.0);
            r.document
                .add_text_box(slide, Rect::inches(0.5, 0.4, 9.0, 1.0), &heading)?;
            let body = TextBlock {
                paragraphs: citations.iter().map(Paragraph::plain).collect(),
                style: r.text_style(12.0, false, r.style.text_color),
                align: Align::Left,
                wrap: true,
            };
            r.document
                .add_text_box(slide, Rect::inches(0.5, 1.5, 9.0, 5.5), &body)
        })?;
        info!("Added citations slide with {} references", citations.len());
        Ok(Some(slide))
    }

    /// Stand-in for a slide whose generation failed
    pub fn add_placeholder_slide(&mut self, topic: &str, diagnostic: &str) -> Result<SlideId> {
        let bullets = vec![format!(
            "Content generation failed: {}",
            truncate_chars(diagnostic, 50)
        )];
        self.content_slide(
            SlideKind::Placeholder,
            topic,
            &bullets,
            Some("Please regenerate this slide."),
            None,
        )
    }

    /// Render a synthesized slide with the layout [`select_layout`] picks
    pub fn render_slide(&mut self, slide: &SlideConfig, image: Option<&ImageAsset>) -> Result<Layout> {
        let layout = select_layout(slide, image.is_some());
        let notes = slide.speaker_notes.as_deref();
        match layout {
            Layout::Statistics => {
                self.add_statistics_slide(&slide.title, slide.statistics(), notes)?;
            }
            Layout::FullscreenImage => {
                let image = image.ok_or_else(|| {
                    Error::render("fullscreen image", "layout selected without an image")
                })?;
                let caption = slide.bullets.first().map(String::as_str);
                self.add_fullscreen_image_slide(image, caption, Some(&slide.title), notes)?;
            }
            Layout::Chart => {
                let chart = slide.chart_data.as_ref().ok_or_else(|| {
                    Error::render("chart", "layout selected without chart data")
                })?;
                self.add_chart_slide(&slide.title, chart, notes)?;
            }
            Layout::Content => {
                self.add_content_slide(&slide.title, &slide.bullets, notes, image)?;
            }
        }
        debug!("Rendered '{}' as {:?}", slide.title, layout);
        Ok(layout)
    }

    /// Serialize the document
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.document.save(path)?;
        info!("Saved presentation to {}", path.display());
        Ok(())
    }
}
