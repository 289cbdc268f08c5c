//! Google Gemini provider
//!
//! Calls `models/{model}:generateContent`. Structured calls set
//! `responseMimeType = application/json` together with `responseJsonSchema`
//! and drop the temperature to 0.2.

use super::{check_status, http_client, is_missing_key, parse_json_text};
use super::{GenerationOptions, LLMProvider, ModelInfo};
use crate::ai::schema::SchemaSpec;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const STRUCTURED_TEMPERATURE: f32 = 0.2;

const KNOWN_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-pro"];

/// Gemini provider
#[derive(Clone)]
pub struct GoogleProvider {
    endpoint: String,
    api_key: String,
    model: String,
    options: GenerationOptions,
    client: Client,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_json_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    input_token_limit: Option<u32>,
}

impl GoogleProvider {
    /// Create a new Gemini provider
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

    async fn generate_content(
        &self,
        prompt: &str,
        system_prompt: &str,
        schema: Option<&SchemaSpec>,
    ) -> Result<String> {
        if is_missing_key(&self.api_key) {
            return Err(Error::api_key(self.name()));
        }

        let system_instruction = (!system_prompt.trim().is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: system_prompt,
            }],
        });
        let generation_config = match schema {
            Some(spec) => GenerationConfig {
                temperature: Some(STRUCTURED_TEMPERATURE),
                max_output_tokens: self.options.max_tokens,
                response_mime_type: Some("application/json"),
                response_json_schema: Some(&spec.schema),
            },
            None => GenerationConfig {
                temperature: self.options.temperature,
                max_output_tokens: self.options.max_tokens,
                response_mime_type: None,
                response_json_schema: None,
            },
        };
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction,
            generation_config,
        };

        debug!("Gemini request: model={} prompt_len={}", self.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.endpoint, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), &self.model, response).await?;
        let body: GenerateResponse = response.json().await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::content_generation(self.name(), "response has no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !is_missing_key(&self.api_key)
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        info!("Generating text with Gemini model: {}", self.model);
        self.generate_content(prompt, system_prompt, None).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        info!("Generating '{}' with Gemini model: {}", schema.name, self.model);
        let text = self.generate_content(prompt, system_prompt, Some(schema)).await?;
        parse_json_text(self.name(), &text)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if is_missing_key(&self.api_key) {
            return Ok(KNOWN_MODELS
                .iter()
                .map(|id| ModelInfo::new(*id, self.name()))
                .collect());
        }

        let response = self
            .client
            .get(format!("{}/models", self.endpoint))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let response = check_status(self.name(), &self.model, response).await?;
        let list: ModelList = response.json().await?;

        Ok(list
            .models
            .into_iter()
            .map(|m| {
                let id = m.name.trim_start_matches("models/").to_string();
                let mut info = ModelInfo::new(id.clone(), "google")
                    .with_name(m.display_name.unwrap_or(id));
                if let Some(limit) = m.input_token_limit {
                    info = info.with_context_window(limit);
                }
                info
            })
            .collect())
    }
}
