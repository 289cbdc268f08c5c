//! AI Generation Service
//!
//! Multi-provider LLM integration producing free text and schema-shaped
//! structures (outlines, slide content) for the deck generator.
//!
//! # Architecture
//!
//! - `AIManager`: provider factory, credential checks, retry wrapping
//! - `AIConfig`: provider configuration (`ai` section of the config file)
//! - `providers`: OpenAI, Gemini, Anthropic, Ollama and the offline mock
//! - `schema`: JSON Schema descriptors and typed `generate_structure`
//! - `prompt`: prompts for outlines and slides
//! - `parser`: JSON extraction from free-form replies
//!
//! # Example
//!
//! ```no_run
//! use autoppt::ai::{generate_structure, AIConfig, AIManager};
//! use autoppt::types::PresentationOutline;
//!
//! async fn outline() -> autoppt::Result<()> {
//!     let manager = AIManager::new(AIConfig::default());
//!     let provider = manager.create_provider(Some("mock"), None)?;
//!     let outline: PresentationOutline =
//!         generate_structure(provider.as_ref(), "Topic: Rust", "").await?;
//!     println!("{} sections", outline.sections.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod manager;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod schema;

pub use config::{AIConfig, ProviderConfig, RetryConfig, SUPPORTED_PROVIDERS};
pub use manager::{AIManager, ProviderStatus};
pub use parser::ResponseParser;
pub use prompt::PromptBuilder;
pub use providers::{GenerationOptions, LLMProvider, MockProvider, ModelInfo, RetryingProvider};
pub use schema::{generate_structure, SchemaSpec};
