//! Ollama LLM Provider Implementation
//!
//! Ollama runs models on your own hardware. No API key required and works
//! offline once a model is pulled. Structured calls pass the JSON Schema in
//! the `format` field of `/api/chat`, which constrains decoding to the schema.
//!
//! # Setup
//!
//! 1. Install Ollama: https://ollama.ai/
//! 2. Download a model: `ollama pull llama3.1`
//! 3. Start the server: `ollama serve`

use super::{check_status, http_client, parse_json_text};
use super::{GenerationOptions, LLMProvider, ModelInfo};
use crate::ai::schema::SchemaSpec;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default local endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Ollama provider for local LLM execution
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    options: GenerationOptions,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: ModelOptions,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `endpoint`
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let options = GenerationOptions {
            timeout: Some(Duration::from_secs(300)),
            ..GenerationOptions::default()
        };
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(options.timeout()),
            options,
        }
    }

    /// Override generation options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.client = http_client(options.timeout());
        self.options = options;
        self
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chat(&self, prompt: &str, system_prompt: &str, format: Option<&Value>) -> Result<String> {
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
            stream: false,
            format,
            options: ModelOptions {
                temperature: self.options.temperature,
                num_predict: self.options.max_tokens,
            },
        };

        debug!("Ollama request: model={} prompt_len={}", self.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::provider(
                        self.name(),
                        format!("cannot reach Ollama at {}. Start it with: ollama serve", self.endpoint),
                    )
                } else {
                    Error::from(e)
                }
            })?;
        let response = check_status(self.name(), &self.model, response).await?;
        let body: ChatResponse = response.json().await?;
        Ok(body.message.content)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_MODEL)
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    // Local server, no credential to check.
    fn is_available(&self) -> bool {
        !self.endpoint.is_empty()
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        info!("Generating text with Ollama model: {}", self.model);
        self.chat(prompt, system_prompt, None).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        info!("Generating '{}' with Ollama model: {}", schema.name, self.model);
        let content = self.chat(prompt, system_prompt, Some(&schema.schema)).await?;
        parse_json_text(self.name(), &content)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        #[derive(Deserialize)]
        struct TagsResponse {
            #[serde(default)]
            models: Vec<OllamaModel>,
        }

        #[derive(Deserialize)]
        struct OllamaModel {
            name: String,
            #[serde(default)]
            size: u64,
        }

        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        let response = check_status(self.name(), &self.model, response).await?;
        let tags: TagsResponse = response.json().await?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| {
                let info = ModelInfo::new(m.name, "ollama");
                if m.size > 0 {
                    info.with_size(m.size)
                } else {
                    info
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::default();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama3.1");
        assert_eq!(provider.endpoint(), "http://localhost:11434");
        assert!(provider.is_available());
    }

    #[test]
    fn test_custom_endpoint_is_normalized() {
        let provider = OllamaProvider::new("http://gpu-box:11434/", "mistral");
        assert_eq!(provider.endpoint(), "http://gpu-box:11434");
    }

    #[tokio::test]
    async fn test_schema_passed_as_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "stream": false, "format": { "type": "object" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.1",
                "message": { "role": "assistant", "content": "{\"value\": \"42\", \"label\": \"Answers\"}" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), DEFAULT_MODEL);
        let spec = SchemaSpec::of::<crate::types::StatisticData>();
        let value = provider.generate_json("Topic: Life", &spec, "").await.unwrap();
        assert_eq!(value["value"], "42");
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "llama3.1:latest", "size": 4920753328u64 }, { "name": "tiny" }]
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), DEFAULT_MODEL);
        let models = provider.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert!(models[0].size.is_some());
        assert!(models[1].size.is_none());
    }
}
