//! PowerPoint (`.pptx`) backend
//!
//! Writes a self-contained PresentationML package: one blank layout, one
//! theme, absolutely positioned shapes, native charts with literal data and
//! notes slides for speaker notes.

mod parts;

use crate::error::{Error, Result};
use crate::render::document::{
    ChartSpec, DeckDocument, Fill, Rect, SlideId, SlideKind, SlideSize, TextBlock,
};
use crate::render::image::ImageAsset;
use crate::render::theme::Rgb;
use parts::{rel, Drawing, Inventory, Relationship};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Clone)]
enum Shape {
    Text { frame: Rect, block: TextBlock },
    Picture { frame: Rect, image: ImageAsset },
    Chart { frame: Rect, chart: ChartSpec },
    Rectangle { frame: Rect, color: Rgb },
}

#[derive(Debug, Clone)]
struct SlideData {
    id: SlideId,
    kind: SlideKind,
    background: Option<Fill>,
    shapes: Vec<Shape>,
    notes: Option<String>,
}

/// In-memory PowerPoint presentation
#[derive(Debug)]
pub struct PptxDocument {
    size: SlideSize,
    slides: Vec<SlideData>,
    next_id: u32,
}

impl Default for PptxDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxDocument {
    /// Create an empty 4:3 presentation
    pub fn new() -> Self {
        Self {
            size: SlideSize::default(),
            slides: Vec::new(),
            next_id: 1,
        }
    }

    fn slide_mut(&mut self, slide: SlideId) -> Result<&mut SlideData> {
        self.slides
            .iter_mut()
            .find(|s| s.id == slide)
            .ok_or_else(|| Error::render("lookup", format!("no slide with id {}", slide.0)))
    }

    // First text on the first slide doubles as the document title.
    fn title(&self) -> &str {
        self.slides
            .first()
            .and_then(|s| {
                s.shapes.iter().find_map(|shape| match shape {
                    Shape::Text { block, .. } => block.paragraphs.first().map(|p| p.text.as_str()),
                    _ => None,
                })
            })
            .unwrap_or("Presentation")
    }

    fn write_package<W: Write + std::io::Seek>(&self, writer: W) -> Result<W> {
        let mut package = Package::new(writer);

        let mut inventory = Inventory {
            slides: self.slides.len(),
            ..Inventory::default()
        };
        let mut media_count = 0usize;

        for (index, slide) in self.slides.iter().enumerate() {
            let number = index + 1;
            let mut rels = vec![Relationship::new(
                "rId1",
                rel::SLIDE_LAYOUT,
                "../slideLayouts/slideLayout1.xml",
            )];
            let mut drawings = Vec::with_capacity(slide.shapes.len());

            for shape in &slide.shapes {
                match shape {
                    Shape::Text { frame, block } => drawings.push(Drawing::Text {
                        frame: *frame,
                        block,
                    }),
                    Shape::Rectangle { frame, color } => drawings.push(Drawing::Rectangle {
                        frame: *frame,
                        color: *color,
                    }),
                    Shape::Picture { frame, image } => {
                        media_count += 1;
                        let format = image.format();
                        let media = format!("image{}.{}", media_count, format.extension());
                        package.part(&format!("ppt/media/{media}"), image.bytes())?;
                        if !inventory
                            .media_types
                            .iter()
                            .any(|(ext, _)| *ext == format.extension())
                        {
                            inventory
                                .media_types
                                .push((format.extension(), format.content_type()));
                        }
                        let rel_id = format!("rId{}", rels.len() + 1);
                        rels.push(Relationship::new(
                            rel_id.clone(),
                            rel::IMAGE,
                            format!("../media/{media}"),
                        ));
                        drawings.push(Drawing::Picture {
                            frame: *frame,
                            rel_id,
                        });
                    }
                    Shape::Chart { frame, chart } => {
                        inventory.charts += 1;
                        let chart_no = inventory.charts;
                        package.text_part(
                            &format!("ppt/charts/chart{chart_no}.xml"),
                            &parts::chart(chart)?,
                        )?;
                        let rel_id = format!("rId{}", rels.len() + 1);
                        rels.push(Relationship::new(
                            rel_id.clone(),
                            rel::CHART,
                            format!("../charts/chart{chart_no}.xml"),
                        ));
                        drawings.push(Drawing::Chart {
                            frame: *frame,
                            rel_id,
                        });
                    }
                }
            }

            if let Some(notes) = slide.notes.as_deref() {
                inventory.notes_slides.push(number);
                rels.push(Relationship::new(
                    format!("rId{}", rels.len() + 1),
                    rel::NOTES_SLIDE,
                    format!("../notesSlides/notesSlide{number}.xml"),
                ));
                package.text_part(
                    &format!("ppt/notesSlides/notesSlide{number}.xml"),
                    &parts::notes_slide(notes)?,
                )?;
                package.text_part(
                    &format!("ppt/notesSlides/_rels/notesSlide{number}.xml.rels"),
                    &parts::relationships(&[
                        Relationship::new(
                            "rId1",
                            rel::NOTES_MASTER,
                            "../notesMasters/notesMaster1.xml",
                        ),
                        Relationship::new("rId2", rel::SLIDE, format!("../slides/slide{number}.xml")),
                    ])?,
                )?;
            }

            package.text_part(
                &format!("ppt/slides/slide{number}.xml"),
                &parts::slide(slide.kind.label(), slide.background.as_ref(), &drawings)?,
            )?;
            package.text_part(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                &parts::relationships(&rels)?,
            )?;
        }

        let has_notes = !inventory.notes_slides.is_empty();
        let slide_rel_ids: Vec<String> = (1..=self.slides.len())
            .map(|n| format!("rId{}", 100 + n))
            .collect();

        let mut pres_rels = vec![
            Relationship::new("rId1", rel::SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            Relationship::new("rId2", rel::THEME, "theme/theme1.xml"),
            Relationship::new("rId3", rel::PRES_PROPS, "presProps.xml"),
            Relationship::new("rId4", rel::VIEW_PROPS, "viewProps.xml"),
            Relationship::new("rId5", rel::TABLE_STYLES, "tableStyles.xml"),
        ];
        if has_notes {
            pres_rels.push(Relationship::new(
                "rId6",
                rel::NOTES_MASTER,
                "notesMasters/notesMaster1.xml",
            ));
        }
        for (n, rel_id) in slide_rel_ids.iter().enumerate() {
            pres_rels.push(Relationship::new(
                rel_id.clone(),
                rel::SLIDE,
                format!("slides/slide{}.xml", n + 1),
            ));
        }

        package.text_part(
            "ppt/presentation.xml",
            &parts::presentation(&slide_rel_ids, has_notes, self.size)?,
        )?;
        package.text_part(
            "ppt/_rels/presentation.xml.rels",
            &parts::relationships(&pres_rels)?,
        )?;
        package.text_part("ppt/presProps.xml", &parts::presentation_properties())?;
        package.text_part("ppt/viewProps.xml", &parts::view_properties())?;
        package.text_part("ppt/tableStyles.xml", &parts::table_styles())?;
        package.text_part("ppt/slideMasters/slideMaster1.xml", &parts::slide_master())?;
        package.text_part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &parts::relationships(&[
                Relationship::new("rId1", rel::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                Relationship::new("rId2", rel::THEME, "../theme/theme1.xml"),
            ])?,
        )?;
        package.text_part("ppt/slideLayouts/slideLayout1.xml", &parts::slide_layout())?;
        package.text_part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &parts::relationships(&[Relationship::new(
                "rId1",
                rel::SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )])?,
        )?;
        package.text_part("ppt/theme/theme1.xml", &parts::theme())?;
        if has_notes {
            package.text_part("ppt/notesMasters/notesMaster1.xml", &parts::notes_master())?;
            package.text_part(
                "ppt/notesMasters/_rels/notesMaster1.xml.rels",
                &parts::relationships(&[Relationship::new(
                    "rId1",
                    rel::THEME,
                    "../theme/theme2.xml",
                )])?,
            )?;
            package.text_part("ppt/theme/theme2.xml", &parts::theme())?;
        }

        let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        package.text_part("docProps/core.xml", &parts::core_properties(self.title(), &created)?)?;
        package.text_part("docProps/app.xml", &parts::app_properties(self.slides.len())?)?;
        package.text_part(
            "_rels/.rels",
            &parts::relationships(&[
                Relationship::new("rId1", rel::OFFICE_DOCUMENT, "ppt/presentation.xml"),
                Relationship::new("rId2", rel::CORE_PROPERTIES, "docProps/core.xml"),
                Relationship::new("rId3", rel::EXTENDED_PROPERTIES, "docProps/app.xml"),
            ])?,
        )?;
        package.text_part("[Content_Types].xml", &parts::content_types(&inventory)?)?;

        debug!(
            "Packaged {} slides, {} pictures, {} charts",
            self.slides.len(),
            media_count,
            inventory.charts
        );
        package.finish()
    }
}

struct Package<W: Write + std::io::Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + std::io::Seek> Package<W> {
    fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated),
        }
    }

    fn part(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(name, self.options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn text_part(&mut self, name: &str, xml: &str) -> Result<()> {
        self.part(name, xml.as_bytes())
    }

    fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

impl DeckDocument for PptxDocument {
    fn slide_size(&self) -> SlideSize {
        self.size
    }

    fn add_slide(&mut self, kind: SlideKind) -> Result<SlideId> {
        let id = SlideId(self.next_id);
        self.next_id += 1;
        self.slides.push(SlideData {
            id,
            kind,
            background: None,
            shapes: Vec::new(),
            notes: None,
        });
        Ok(id)
    }

    fn discard_slide(&mut self, slide: SlideId) -> Result<()> {
        let position = self
            .slides
            .iter()
            .position(|s| s.id == slide)
            .ok_or_else(|| Error::render("discard slide", format!("no slide with id {}", slide.0)))?;
        self.slides.remove(position);
        Ok(())
    }

    fn set_background(&mut self, slide: SlideId, fill: &Fill) -> Result<()> {
        self.slide_mut(slide)?.background = Some(fill.clone());
        Ok(())
    }

    fn add_text_box(&mut self, slide: SlideId, frame: Rect, text: &TextBlock) -> Result<()> {
        self.slide_mut(slide)?.shapes.push(Shape::Text {
            frame,
            block: text.clone(),
        });
        Ok(())
    }

    fn add_picture(&mut self, slide: SlideId, image: &ImageAsset, frame: Rect) -> Result<()> {
        self.slide_mut(slide)?.shapes.push(Shape::Picture {
            frame,
            image: image.clone(),
        });
        Ok(())
    }

    fn add_chart(&mut self, slide: SlideId, chart: &ChartSpec, frame: Rect) -> Result<()> {
        if chart.categories.len() != chart.values.len() {
            return Err(Error::InvalidChartData {
                categories: chart.categories.len(),
                values: chart.values.len(),
            });
        }
        self.slide_mut(slide)?.shapes.push(Shape::Chart {
            frame,
            chart: chart.clone(),
        });
        Ok(())
    }

    fn add_rectangle(&mut self, slide: SlideId, frame: Rect, color: Rgb) -> Result<()> {
        self.slide_mut(slide)?
            .shapes
            .push(Shape::Rectangle { frame, color });
        Ok(())
    }

    fn set_notes(&mut self, slide: SlideId, notes: &str) -> Result<()> {
        self.slide_mut(slide)?.notes = Some(notes.to_string());
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = self.write_package(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }
}
