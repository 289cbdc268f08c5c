//! LLM Provider Abstraction Layer
//!
//! This module defines the `LLMProvider` trait that every generation backend
//! implements. The orchestrator only ever holds a `Box<dyn LLMProvider>`, so a
//! new backend plugs in without touching the pipeline.
//!
//! # Supported Providers
//!
//! - **OpenAI**: schema-native structured output (`json_schema` response format)
//! - **Google Gemini**: schema-native structured output (`responseJsonSchema`)
//! - **Ollama**: local models, schema passed through the `format` field
//! - **Anthropic**: prompt-engineered JSON, validated locally
//! - **Mock**: deterministic offline content, no network
//!
//! Network backends built by [`AIManager`](super::AIManager) are wrapped in a
//! [`RetryingProvider`] that retries on rate limiting.
//!
//! # Example
//!
//! ```no_run
//! use autoppt::ai::providers::{LLMProvider, MockProvider};
//!
//! async fn example() -> autoppt::Result<()> {
//!     let provider = MockProvider::new();
//!     let text = provider.generate_text("Summarize the topic: Rust", "").await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::schema::SchemaSpec;

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use retry::RetryingProvider;

/// Options for controlling LLM generation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0-2.0)
    ///
    /// Schema-constrained calls on some backends override this with a lower
    /// value to keep the JSON stable.
    pub temperature: Option<f32>,

    /// Request timeout
    pub timeout: Option<Duration>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(4096),
            temperature: Some(0.7),
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl GenerationOptions {
    /// Effective request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(120))
    }
}

/// Information about an available LLM model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique model identifier (e.g., "gpt-4o", "llama3.1")
    pub id: String,

    /// Human-readable model name
    pub name: String,

    /// Provider name (e.g., "ollama", "openai")
    pub provider: String,

    /// Model size in bytes (for local models)
    pub size: Option<u64>,

    /// Context window size (max input tokens)
    pub context_window: Option<u32>,
}

impl ModelInfo {
    /// Model whose display name is its id
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider: provider.into(),
            size: None,
            context_window: None,
        }
    }

    /// Builder method to set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method to set size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Builder method to set context window
    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = Some(tokens);
        self
    }

    /// Format size as human-readable string
    pub fn size_human_readable(&self) -> String {
        match self.size {
            None => "Unknown".to_string(),
            Some(bytes) => {
                const GB: u64 = 1_073_741_824;
                const MB: u64 = 1_048_576;

                if bytes >= GB {
                    format!("{:.2} GB", bytes as f64 / GB as f64)
                } else if bytes >= MB {
                    format!("{:.2} MB", bytes as f64 / MB as f64)
                } else {
                    format!("{} B", bytes)
                }
            }
        }
    }
}

/// Main trait that all LLM providers must implement
///
/// `generate_json` receives the target schema as a [`SchemaSpec`] and returns
/// an untyped JSON value; typed access goes through
/// [`generate_structure`](super::generate_structure), which turns a
/// non-conforming value into a content generation error.
#[async_trait]
pub trait LLMProvider: Send + Sync + fmt::Debug {
    /// Lowercase provider identifier, e.g. "openai"
    fn name(&self) -> &str;

    /// Model used for generation
    fn model(&self) -> &str;

    /// Whether the provider is configured well enough to be called
    ///
    /// Cloud providers check their credential; this never touches the network.
    fn is_available(&self) -> bool;

    /// Offline providers are never paced or retried
    fn is_offline(&self) -> bool {
        false
    }

    /// Free-form text generation
    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String>;

    /// Structured generation constrained by `schema`
    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value>;

    /// Models this provider can serve
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

/// Build the shared HTTP client for a backend
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("autoppt/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// True when a configured key is absent or an unexpanded `${VAR}` placeholder
pub(crate) fn is_missing_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.starts_with("${")
}

/// `Retry-After` header in whole seconds
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Map a non-success HTTP status onto the error taxonomy
///
/// 401/403 mean a bad credential, 404 an unknown model, 429 throttling.
/// Everything else is a generic provider failure carrying the response body.
pub(crate) async fn check_status(provider: &str, model: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::api_key(provider)),
        StatusCode::NOT_FOUND => Err(Error::ModelNotFound {
            model: model.to_string(),
            provider: provider.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let wait = retry_after(response.headers());
            tracing::warn!("{} rate limit hit (retry-after: {:?})", provider, wait);
            Err(Error::rate_limit(provider, wait))
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            let body = crate::utils::truncate_chars(body.trim(), 300);
            Err(Error::provider(provider, format!("HTTP {}: {}", status, body)))
        }
    }
}

/// Parse text the backend promised would be JSON
pub(crate) fn parse_json_text(provider: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text.trim()).map_err(|e| {
        Error::content_generation(provider, format!("backend returned invalid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_default() {
        let options = GenerationOptions::default();
        assert_eq!(options.max_tokens, Some(4096));
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_model_info_builder() {
        let model = ModelInfo::new("llama3.1", "ollama")
            .with_size(4_920_753_328)
            .with_context_window(8192);
        assert_eq!(model.name, "llama3.1");
        assert_eq!(model.size_human_readable(), "4.58 GB");
        assert_eq!(model.context_window, Some(8192));
        assert_eq!(ModelInfo::new("x", "y").size_human_readable(), "Unknown");
    }

    #[test]
    fn test_missing_key_detection() {
        assert!(is_missing_key(""));
        assert!(is_missing_key("  "));
        assert!(is_missing_key("${OPENAI_API_KEY}"));
        assert!(!is_missing_key("sk-live-123"));
    }

    #[test]
    fn test_invalid_json_is_content_error() {
        let err = parse_json_text("openai", "not json").unwrap_err();
        assert!(matches!(err, Error::ContentGeneration { .. }));
        assert_eq!(parse_json_text("openai", " {\"a\":1} ").unwrap()["a"], 1);
    }
}
