//! OpenAI LLM Provider Implementation
//!
//! Uses the Chat Completions API. Structured calls send the target schema as a
//! `json_schema` response format, so the backend itself guarantees the shape.
//!
//! # Setup
//!
//! 1. Get API key from https://platform.openai.com/api-keys
//! 2. Put it in `.env`: `OPENAI_API_KEY=sk-...`
//! 3. Use with autoppt: `--provider openai`

use super::{check_status, http_client, is_missing_key, parse_json_text};
use super::{GenerationOptions, LLMProvider, ModelInfo};
use crate::ai::schema::SchemaSpec;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

const KNOWN_MODELS: &[&str] = &["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"];

/// OpenAI provider for cloud-based LLM execution
#[derive(Clone)]
pub struct OpenAIProvider {
    endpoint: String,
    api_key: String,
    model: String,
    options: GenerationOptions,
    client: Client,
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let options = GenerationOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http_client(options.timeout()),
            options,
        }
    }

    /// Point at a different API base (proxies, Azure-compatible gateways, tests)
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

    /// API base in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chat(
        &self,
        prompt: &str,
        system_prompt: &str,
        response_format: Option<Value>,
    ) -> Result<String> {
        if is_missing_key(&self.api_key) {
            return Err(Error::api_key(self.name()));
        }

        let mut messages = Vec::with_capacity(2);
        if !system_prompt.trim().is_empty() {
            messages.push(Message {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            response_format,
        };

        debug!("OpenAI request: model={} prompt_len={}", self.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), &self.model, response).await?;
        let body: ChatResponse = response.json().await?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::content_generation(self.name(), "response has no choices"))?;

        if let Some(refusal) = message.refusal {
            return Err(Error::content_generation(self.name(), format!("model refused: {}", refusal)));
        }
        message
            .content
            .ok_or_else(|| Error::content_generation(self.name(), "response has no content"))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !is_missing_key(&self.api_key)
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        info!("Generating text with OpenAI model: {}", self.model);
        self.chat(prompt, system_prompt, None).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        info!("Generating '{}' with OpenAI model: {}", schema.name, self.model);
        let response_format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": false,
            }
        });
        let content = self.chat(prompt, system_prompt, Some(response_format)).await?;
        parse_json_text(self.name(), &content)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(KNOWN_MODELS
            .iter()
            .map(|id| ModelInfo::new(*id, self.name()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PresentationOutline;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("sk-test", DEFAULT_MODEL);
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");
        assert_eq!(provider.endpoint(), DEFAULT_ENDPOINT);
        assert!(provider.is_available());
        assert!(!OpenAIProvider::new("${OPENAI_API_KEY}", DEFAULT_MODEL).is_available());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let server = MockServer::start().await;
        let provider = OpenAIProvider::new("", DEFAULT_MODEL).with_endpoint(server.uri());
        let err = provider.generate_text("hi", "").await.unwrap_err();
        assert!(matches!(err, Error::ApiKey { .. }));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_structured_request_uses_json_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "response_format": { "type": "json_schema", "json_schema": { "name": "PresentationOutline" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"title": "Deck", "sections": [{"title": "A", "slides": ["a1"]}]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("sk-test", DEFAULT_MODEL).with_endpoint(server.uri());
        let outline: PresentationOutline =
            crate::ai::generate_structure(&provider, "Topic: Rust", "").await.unwrap();
        assert_eq!(outline.title, "Deck");
        assert_eq!(outline.total_slides(), 1);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("sk-test", DEFAULT_MODEL).with_endpoint(server.uri());
        match provider.generate_text("hi", "be brief").await {
            Err(Error::RateLimit { provider, retry_after }) => {
                assert_eq!(provider, "openai");
                assert_eq!(retry_after, Some(7));
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_api_key_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("sk-revoked", DEFAULT_MODEL).with_endpoint(server.uri());
        let err = provider.generate_text("hi", "").await.unwrap_err();
        assert!(matches!(err, Error::ApiKey { .. }));
    }
}
