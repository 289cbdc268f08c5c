//! Anthropic LLM Provider Implementation
//!
//! Claude has no schema-constrained output mode on the Messages API, so
//! structured calls are prompt-engineered: the schema is serialized into the
//! prompt, the reply is stripped of code fences and parsed, and required
//! fields are checked locally before the value is returned.
//!
//! # Setup
//!
//! 1. Get API key from https://console.anthropic.com/
//! 2. Put it in `.env`: `ANTHROPIC_API_KEY=sk-ant-...`
//! 3. Use with autoppt: `--provider anthropic`

use super::{check_status, http_client, is_missing_key};
use super::{GenerationOptions, LLMProvider, ModelInfo};
use crate::ai::parser::ResponseParser;
use crate::ai::prompt::PromptBuilder;
use crate::ai::schema::SchemaSpec;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anthropic API version to use
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

const KNOWN_MODELS: &[(&str, u32)] = &[
    ("claude-3-5-sonnet-20241022", 200_000),
    ("claude-3-opus-20240229", 200_000),
];

/// Anthropic provider for Claude models
#[derive(Clone)]
pub struct AnthropicProvider {
    endpoint: String,
    api_key: String,
    model: String,
    options: GenerationOptions,
    client: Client,
    parser: Arc<ResponseParser>,
    prompts: PromptBuilder,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let options = GenerationOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http_client(options.timeout()),
            options,
            parser: Arc::new(ResponseParser::new()),
            prompts: PromptBuilder::new(),
        }
    }

    /// Point at a different API base
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Override generation options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.client = http_client(options.timeout());
        self.options = options;
        self
    }

    async fn messages(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        if is_missing_key(&self.api_key) {
            return Err(Error::api_key(self.name()));
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.options.max_tokens.unwrap_or(4096),
            system: Some(system_prompt).filter(|s| !s.trim().is_empty()),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.options.temperature,
        };

        debug!("Anthropic request: model={} prompt_len={}", self.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), &self.model, response).await?;
        let body: MessagesResponse = response.json().await?;

        if body.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Anthropic response truncated at max_tokens");
        }

        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        if text.trim().is_empty() {
            return Err(Error::content_generation(self.name(), "response has no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !is_missing_key(&self.api_key)
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        info!("Generating text with Anthropic model: {}", self.model);
        self.messages(prompt, system_prompt).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        info!("Generating '{}' with Anthropic model: {}", schema.name, self.model);
        let full_prompt = format!("{}{}", prompt, self.prompts.json_instructions(schema));
        let text = self.messages(&full_prompt, system_prompt).await?;

        let value = self.parser.extract_json(self.name(), &text)?;
        let missing = schema.missing_fields(&value);
        if !missing.is_empty() {
            return Err(Error::content_generation(
                self.name(),
                format!(
                    "response for '{}' is missing required fields: {}",
                    schema.name,
                    missing.join(", ")
                ),
            ));
        }
        Ok(value)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(KNOWN_MODELS
            .iter()
            .map(|(id, window)| ModelInfo::new(*id, self.name()).with_context_window(*window))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PresentationOutline;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn claude_reply(text: &str) -> Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn"
        })
    }

    async fn provider_replying(text: &str) -> (MockServer, AnthropicProvider) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(claude_reply(text)))
            .mount(&server)
            .await;
        let provider = AnthropicProvider::new("sk-ant-test", DEFAULT_MODEL).with_endpoint(server.uri());
        (server, provider)
    }

    #[tokio::test]
    async fn test_fenced_json_is_parsed() {
        let (server, provider) = provider_replying(
            "```json\n{\"title\": \"Solar\", \"sections\": [{\"title\": \"Basics\", \"slides\": [\"Cells\", \"Panels\"]}]}\n```",
        )
        .await;

        let outline: PresentationOutline =
            crate::ai::generate_structure(&provider, "Topic: Solar", "").await.unwrap();
        assert_eq!(outline.sections[0].slides.len(), 2);

        let requests = server.received_requests().await.unwrap_or_default();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let content = sent["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("You MUST respond with valid JSON"));
        assert!(sent.get("system").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_content_error() {
        let (_server, provider) = provider_replying(r#"{"title": "No sections here"}"#).await;
        let spec = SchemaSpec::of::<PresentationOutline>();
        let err = provider.generate_json("Topic: Solar", &spec, "").await.unwrap_err();
        assert!(matches!(err, Error::ContentGeneration { .. }));
        assert!(err.to_string().contains("sections"));
    }

    #[tokio::test]
    async fn test_prose_reply_is_content_error() {
        let (_server, provider) = provider_replying("Sorry, I can't produce that.").await;
        let spec = SchemaSpec::of::<PresentationOutline>();
        let err = provider.generate_json("Topic: Solar", &spec, "").await.unwrap_err();
        assert!(matches!(err, Error::ContentGeneration { .. }));
    }

    #[tokio::test]
    async fn test_known_models() {
        let provider = AnthropicProvider::new("sk-ant-test", DEFAULT_MODEL);
        let models = provider.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].context_window, Some(200_000));
    }
}
