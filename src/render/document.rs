//! Render surface abstraction
//!
//! [`DeckDocument`] is the narrow set of primitives the slide renderer
//! needs from a document backend. Geometry is expressed in EMUs (English
//! Metric Units, 914400 per inch), the native unit of Office documents.

use crate::error::{Error, Result};
use crate::render::image::{ImageAsset, ImageFormat};
use crate::render::theme::Rgb;
use crate::types::ChartType;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// English Metric Unit
pub type Emu = i64;

/// EMUs per inch
pub const EMU_PER_INCH: Emu = 914_400;

/// Convert inches to EMUs
pub fn inches(value: f64) -> Emu {
    (value * EMU_PER_INCH as f64).round() as Emu
}

/// Positioned rectangle on a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    /// Left edge
    pub x: Emu,
    /// Top edge
    pub y: Emu,
    /// Width
    pub cx: Emu,
    /// Height
    pub cy: Emu,
}

impl Rect {
    /// Build a rectangle from inch measurements
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            cx: inches(width),
            cy: inches(height),
        }
    }
}

/// Canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideSize {
    /// Width
    pub cx: Emu,
    /// Height
    pub cy: Emu,
}

impl Default for SlideSize {
    /// 10 x 7.5 inches (4:3)
    fn default() -> Self {
        Self {
            cx: 9_144_000,
            cy: 6_858_000,
        }
    }
}

/// Stable identifier of a slide within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlideId(pub u32);

/// What a slide is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    /// Deck title
    Title,
    /// Section divider
    SectionHeader,
    /// Bullets with optional side picture
    Content,
    /// Native chart
    Chart,
    /// Headline figures
    Statistics,
    /// Picture covering the canvas
    FullscreenImage,
    /// Source list
    References,
    /// Stand-in for a slide that failed to generate
    Placeholder,
}

impl SlideKind {
    /// Human-readable layout name
    pub fn label(&self) -> &'static str {
        match self {
            SlideKind::Title => "Title Slide",
            SlideKind::SectionHeader => "Section Header",
            SlideKind::Content => "Title and Content",
            SlideKind::Chart => "Chart",
            SlideKind::Statistics => "Statistics",
            SlideKind::FullscreenImage => "Picture",
            SlideKind::References => "References",
            SlideKind::Placeholder => "Placeholder",
        }
    }
}

/// Slide background
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fill {
    /// Single color
    Solid {
        /// Fill color
        color: Rgb,
    },
    /// Two-stop linear gradient
    Gradient {
        /// First stop
        start: Rgb,
        /// Second stop
        end: Rgb,
        /// Direction in degrees, counter-clockwise, 270 is top to bottom
        angle: f64,
    },
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Left aligned
    #[default]
    Left,
    /// Centered
    Center,
}

/// Font attributes of a text run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font family
    pub font: String,
    /// Size in points
    pub size_pt: f64,
    /// Bold weight
    pub bold: bool,
    /// Run color
    pub color: Rgb,
}

/// One paragraph of a text box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// Text content; embedded newlines become separate paragraphs
    pub text: String,
    /// Indentation level, 0 for top level
    pub level: u8,
    /// Render with a bullet glyph
    pub bullet: bool,
}

impl Paragraph {
    /// Unbulleted paragraph
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: 0,
            bullet: false,
        }
    }

    /// Bulleted paragraph; an indented marker or a leading `◦` makes it a sub-bullet
    pub fn bullet(text: &str) -> Self {
        let indented = text.starts_with(' ') || text.starts_with('\t');
        let trimmed = text.trim_start();
        let (level, body) = match trimmed.chars().next() {
            Some(marker @ ('•' | '◦' | '-' | '*' | '▪')) => {
                let body = trimmed[marker.len_utf8()..].trim_start();
                let level = if indented || marker == '◦' { 1 } else { 0 };
                (level, body)
            }
            _ => (0, trimmed),
        };
        Self {
            text: body.to_string(),
            level,
            bullet: true,
        }
    }
}

/// Styled text box content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    /// Paragraphs in order
    pub paragraphs: Vec<Paragraph>,
    /// Run style shared by all paragraphs
    pub style: TextStyle,
    /// Alignment shared by all paragraphs
    pub align: Align,
    /// Wrap text inside the box
    pub wrap: bool,
}

impl TextBlock {
    /// Single-paragraph block
    pub fn line(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            paragraphs: vec![Paragraph::plain(text)],
            style,
            align: Align::Left,
            wrap: true,
        }
    }

    /// Set alignment
    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Native chart kinds understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Horizontal clustered bars
    BarClustered,
    /// Vertical clustered bars
    ColumnClustered,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
}

impl From<ChartType> for ChartKind {
    fn from(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Bar => ChartKind::BarClustered,
            ChartType::Column => ChartKind::ColumnClustered,
            ChartType::Line => ChartKind::Line,
            ChartType::Pie => ChartKind::Pie,
        }
    }
}

/// Chart ready to be embedded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Chart kind
    pub kind: ChartKind,
    /// Title shown above the plot
    pub title: String,
    /// Category labels
    pub categories: Vec<String>,
    /// Series label
    pub series_name: String,
    /// One value per category
    pub values: Vec<f64>,
}

/// Primitives a slide deck backend must provide
pub trait DeckDocument: Send + fmt::Debug {
    /// Canvas size
    fn slide_size(&self) -> SlideSize;

    /// Append an empty slide
    fn add_slide(&mut self, kind: SlideKind) -> Result<SlideId>;

    /// Remove a slide added earlier
    fn discard_slide(&mut self, slide: SlideId) -> Result<()>;

    /// Set the background; backends without gradient support return a render error
    fn set_background(&mut self, slide: SlideId, fill: &Fill) -> Result<()>;

    /// Add a text box
    fn add_text_box(&mut self, slide: SlideId, frame: Rect, text: &TextBlock) -> Result<()>;

    /// Add a picture
    fn add_picture(&mut self, slide: SlideId, image: &ImageAsset, frame: Rect) -> Result<()>;

    /// Add a chart
    fn add_chart(&mut self, slide: SlideId, chart: &ChartSpec, frame: Rect) -> Result<()>;

    /// Add a filled rectangle without border
    fn add_rectangle(&mut self, slide: SlideId, frame: Rect, color: Rgb) -> Result<()>;

    /// Replace the speaker notes
    fn set_notes(&mut self, slide: SlideId, notes: &str) -> Result<()>;

    /// Number of slides currently in the deck
    fn slide_count(&self) -> usize;

    /// Serialize to a file
    fn save(&mut self, path: &Path) -> Result<()>;
}

/// Element placed on a recorded slide
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    /// Text box
    Text {
        /// Placement
        frame: Rect,
        /// Content
        block: TextBlock,
    },
    /// Picture
    Picture {
        /// Placement
        frame: Rect,
        /// Detected format
        format: ImageFormat,
        /// Payload size
        bytes: usize,
    },
    /// Chart
    Chart {
        /// Placement
        frame: Rect,
        /// Chart data
        chart: ChartSpec,
    },
    /// Decoration rectangle
    Rectangle {
        /// Placement
        frame: Rect,
        /// Fill color
        color: Rgb,
    },
}

/// A slide as recorded by [`MemoryDocument`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedSlide {
    /// Identifier
    pub id: SlideId,
    /// Slide kind
    pub kind: SlideKind,
    /// Background, if set
    pub background: Option<Fill>,
    /// Elements in insertion order
    pub elements: Vec<Element>,
    /// Speaker notes
    pub notes: Option<String>,
}

impl RecordedSlide {
    /// All text on the slide, one entry per paragraph
    pub fn texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { block, .. } => Some(block),
                _ => None,
            })
            .flat_map(|block| block.paragraphs.iter().map(|p| p.text.as_str()))
            .collect()
    }
}

/// Everything [`MemoryDocument`] has seen
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckRecord {
    /// Canvas size
    pub size: Option<SlideSize>,
    /// Slides in order
    pub slides: Vec<RecordedSlide>,
    /// Number of discarded slides
    pub discarded: usize,
    /// Number of rejected gradient requests
    pub gradient_rejections: usize,
    /// Paths written by `save`
    #[serde(skip)]
    pub saved_to: Vec<PathBuf>,
}

impl DeckRecord {
    /// Slides of one kind
    pub fn slides_of(&self, kind: SlideKind) -> Vec<&RecordedSlide> {
        self.slides.iter().filter(|s| s.kind == kind).collect()
    }
}

/// Shared view of a [`MemoryDocument`]'s record
pub type DeckHandle = Arc<Mutex<DeckRecord>>;

/// In-memory backend that serializes a JSON description of the deck
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    record: DeckHandle,
    next_id: u32,
    gradients: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        let record = DeckRecord {
            size: Some(SlideSize::default()),
            ..DeckRecord::default()
        };
        Self {
            record: Arc::new(Mutex::new(record)),
            next_id: 1,
            gradients: true,
        }
    }

    /// Reject gradient fills like a backend without gradient support
    pub fn without_gradients(mut self) -> Self {
        self.gradients = false;
        self
    }

    /// Handle that stays valid after the document is moved into a renderer
    pub fn handle(&self) -> DeckHandle {
        Arc::clone(&self.record)
    }

    fn with_slide<F>(&self, slide: SlideId, f: F) -> Result<()>
    where
        F: FnOnce(&mut RecordedSlide),
    {
        let mut record = self.record.lock();
        let found = record
            .slides
            .iter_mut()
            .find(|s| s.id == slide)
            .ok_or_else(|| Error::render("lookup", format!("no slide with id {}", slide.0)))?;
        f(found);
        Ok(())
    }
}

impl DeckDocument for MemoryDocument {
    fn slide_size(&self) -> SlideSize {
        SlideSize::default()
    }

    fn add_slide(&mut self, kind: SlideKind) -> Result<SlideId> {
        let id = SlideId(self.next_id);
        self.next_id += 1;
        self.record.lock().slides.push(RecordedSlide {
            id,
            kind,
            background: None,
            elements: Vec::new(),
            notes: None,
        });
        Ok(id)
    }

    fn discard_slide(&mut self, slide: SlideId) -> Result<()> {
        let mut record = self.record.lock();
        let before = record.slides.len();
        record.slides.retain(|s| s.id != slide);
        if record.slides.len() == before {
            return Err(Error::render("discard slide", format!("no slide with id {}", slide.0)));
        }
        record.discarded += 1;
        Ok(())
    }

    fn set_background(&mut self, slide: SlideId, fill: &Fill) -> Result<()> {
        if matches!(fill, Fill::Gradient { .. }) && !self.gradients {
            self.record.lock().gradient_rejections += 1;
            return Err(Error::render("set background", "gradient fills are not supported"));
        }
        let fill = fill.clone();
        self.with_slide(slide, |s| s.background = Some(fill))
    }

    fn add_text_box(&mut self, slide: SlideId, frame: Rect, text: &TextBlock) -> Result<()> {
        let block = text.clone();
        self.with_slide(slide, |s| s.elements.push(Element::Text { frame, block }))
    }

    fn add_picture(&mut self, slide: SlideId, image: &ImageAsset, frame: Rect) -> Result<()> {
        let (format, bytes) = (image.format(), image.bytes().len());
        self.with_slide(slide, |s| {
            s.elements.push(Element::Picture {
                frame,
                format,
                bytes,
            })
        })
    }

    fn add_chart(&mut self, slide: SlideId, chart: &ChartSpec, frame: Rect) -> Result<()> {
        let chart = chart.clone();
        self.with_slide(slide, |s| s.elements.push(Element::Chart { frame, chart }))
    }

    fn add_rectangle(&mut self, slide: SlideId, frame: Rect, color: Rgb) -> Result<()> {
        self.with_slide(slide, |s| s.elements.push(Element::Rectangle { frame, color }))
    }

    fn set_notes(&mut self, slide: SlideId, notes: &str) -> Result<()> {
        let notes = notes.to_string();
        self.with_slide(slide, |s| s.notes = Some(notes))
    }

    fn slide_count(&self) -> usize {
        self.record.lock().slides.len()
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut record = self.record.lock();
        let json = serde_json::to_vec_pretty(&*record)?;
        std::fs::write(path, json)?;
        record.saved_to.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_emu() {
        assert_eq!(inches(1.0), 914_400);
        assert_eq!(inches(0.05), 45_720);
        assert_eq!(Rect::inches(0.5, 1.2, 2.0, 0.05).cx, 1_828_800);
    }

    #[test]
    fn test_bullet_levels() {
        assert_eq!(Paragraph::bullet("Top level").level, 0);
        let sub = Paragraph::bullet("  • Detail");
        assert_eq!(sub.level, 1);
        assert_eq!(sub.text, "Detail");
        assert_eq!(Paragraph::bullet("- Dash item").level, 0);
        assert_eq!(Paragraph::bullet("- Dash item").text, "Dash item");
        let dash_sub = Paragraph::bullet("    - Dash detail");
        assert_eq!(dash_sub.level, 1);
        assert_eq!(dash_sub.text, "Dash detail");
        assert_eq!(Paragraph::bullet("\t* Tabbed").level, 1);
        assert_eq!(Paragraph::bullet("◦ Hollow").level, 1);
        assert_eq!(Paragraph::bullet("• Marked").level, 0);
    }

    #[test]
    fn test_memory_document_discard() {
        let mut doc = MemoryDocument::new();
        let handle = doc.handle();
        let first = doc.add_slide(SlideKind::Title).unwrap();
        let second = doc.add_slide(SlideKind::Content).unwrap();
        doc.discard_slide(second).unwrap();

        assert_eq!(doc.slide_count(), 1);
        assert_eq!(handle.lock().discarded, 1);
        assert!(doc.set_notes(second, "gone").is_err());
        assert!(doc.set_notes(first, "kept").is_ok());
    }

    #[test]
    fn test_memory_document_rejects_gradients_when_configured() {
        let mut doc = MemoryDocument::new().without_gradients();
        let slide = doc.add_slide(SlideKind::Content).unwrap();
        let gradient = Fill::Gradient {
            start: Rgb(0, 0, 0),
            end: Rgb::WHITE,
            angle: 270.0,
        };
        assert!(matches!(
            doc.set_background(slide, &gradient),
            Err(Error::Render { .. })
        ));
        assert_eq!(doc.handle().lock().gradient_rejections, 1);
    }

    #[test]
    fn test_memory_document_saves_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deck.json");
        let mut doc = MemoryDocument::new();
        let slide = doc.add_slide(SlideKind::Title).unwrap();
        doc.add_text_box(
            slide,
            Rect::inches(1.0, 1.0, 8.0, 1.0),
            &TextBlock::line(
                "Hello",
                TextStyle {
                    font: "Arial".to_string(),
                    size_pt: 44.0,
                    bold: true,
                    color: Rgb(0, 0, 0),
                },
            ),
        )
        .unwrap();
        doc.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["slides"][0]["kind"], "title");
        assert_eq!(
            value["slides"][0]["elements"][0]["block"]["paragraphs"][0]["text"],
            "Hello"
        );
    }
}
