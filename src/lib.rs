// AutoPPT: AI-Powered Presentation Generator
// Copyright (c) 2024 AutoPPT Core Team

//! # AutoPPT Library
//!
//! Turns a short topic into a complete slide deck: a language model plans a
//! hierarchical outline, every slide is researched on the web, the model
//! synthesizes structured slide content from that research and a theme
//! engine renders it into a PowerPoint file.
//!
//! ```no_run
//! use autoppt::prelude::*;
//! use std::path::Path;
//!
//! # async fn demo() -> autoppt::Result<()> {
//! let config = Config::default();
//! let generator = Generator::from_config(&config, Some("mock"), None, GeneratorOptions::default())?;
//! generator
//!     .generate("Artificial Intelligence", "minimalist", Path::new("ai.pptx"), 6, "English")
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

// Core modules
pub mod ai;
pub mod banner;
pub mod config;
pub mod error;
pub mod generator;
pub mod progress;
pub mod render;
pub mod research;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use crate::ai::{AIConfig, AIManager, GenerationOptions, LLMProvider, MockProvider, ModelInfo};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::generator::{Generator, GeneratorOptions, GeneratorSettings};
pub use crate::render::{apply_style, OutputFormat, SlideRenderer, StyleBundle};
pub use crate::types::{PresentationOutline, SlideConfig, SlideType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{generate_structure, AIManager, LLMProvider};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::generator::{CitationSet, Generator, GeneratorOptions, GeneratorSettings};
    pub use crate::render::{apply_style, DeckDocument, OutputFormat, SlideRenderer, StyleBundle};
    pub use crate::research::{Researcher, SearchResult};
    pub use crate::types::{
        ChartData, ChartType, PresentationOutline, PresentationSection, SlideConfig, SlideType,
        StatisticData,
    };
    pub use async_trait::async_trait;
}
