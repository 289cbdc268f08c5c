//! Theme and render engine
//!
//! Resolves a style name into a [`StyleBundle`] and draws slides through a
//! [`DeckDocument`] backend. Two backends ship with the crate: the PowerPoint
//! writer and an in-memory recorder that serializes to JSON.

pub mod document;
pub mod engine;
pub mod image;
pub mod pptx;
pub mod theme;

pub use document::{DeckDocument, DeckHandle, MemoryDocument, SlideKind};
pub use engine::{select_layout, Layout, SlideRenderer};
pub use image::{ImageAsset, ImageFormat};
pub use pptx::PptxDocument;
pub use theme::{apply_style, style_names, Rgb, StyleBundle, DEFAULT_STYLE};

use serde::{Deserialize, Serialize};

/// Output document format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PowerPoint package
    #[default]
    Pptx,
    /// JSON description of the rendered deck
    Json,
}

impl OutputFormat {
    /// File extension
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pptx => "pptx",
            OutputFormat::Json => "json",
        }
    }

    /// Fresh, empty document for this format
    pub fn new_document(&self) -> Box<dyn DeckDocument> {
        match self {
            OutputFormat::Pptx => Box::new(PptxDocument::new()),
            OutputFormat::Json => Box::new(MemoryDocument::new()),
        }
    }
}
