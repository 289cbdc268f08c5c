//! AI Manager - provider factory
//!
//! Turns a provider name and optional model override into a ready-to-use
//! `Box<dyn LLMProvider>`. Credentials are checked here, so a missing key is
//! reported before any network call or any other pipeline work.

use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

use super::config::{AIConfig, SUPPORTED_PROVIDERS};
use super::providers::{anthropic, google, ollama, openai};
use super::providers::{
    AnthropicProvider, GoogleProvider, LLMProvider, MockProvider, ModelInfo, OllamaProvider,
    OpenAIProvider, RetryingProvider,
};

/// Provider factory backed by an [`AIConfig`]
#[derive(Debug, Clone, Default)]
pub struct AIManager {
    config: AIConfig,
}

/// Summary of one provider for the `providers` command
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Provider name
    pub name: String,
    /// Configured model
    pub model: String,
    /// Whether a provider could be built (credential present, enabled)
    pub available: bool,
    /// Models the provider reports
    pub models: Vec<ModelInfo>,
    /// Why the provider is unavailable or could not list models
    pub note: Option<String>,
}

impl AIManager {
    /// Create a manager over `config`
    pub fn new(config: AIConfig) -> Self {
        Self { config }
    }

    /// Underlying configuration
    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    /// Build the provider `name` (default provider when `None`)
    ///
    /// Names are matched case-insensitively. Network providers come back
    /// wrapped in a [`RetryingProvider`].
    pub fn create_provider(
        &self,
        name: Option<&str>,
        model_override: Option<&str>,
    ) -> Result<Box<dyn LLMProvider>> {
        let name = name
            .unwrap_or_else(|| self.config.default_provider_name())
            .trim()
            .to_ascii_lowercase();

        if !SUPPORTED_PROVIDERS.contains(&name.as_str()) {
            return Err(Error::config(format!(
                "Unknown provider: {}. Supported: {}",
                name,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
        if let Some(entry) = self.config.get_provider(&name) {
            if !entry.enabled {
                return Err(Error::config(format!(
                    "Provider '{}' is disabled in the configuration",
                    name
                )));
            }
        }

        let entry = self.config.get_provider(&name);
        let options = entry.map(|p| p.generation_options()).unwrap_or_default();
        let endpoint = entry.and_then(|p| p.endpoint.clone());
        let model = |fallback: &str| {
            self.config
                .model_for(&name, model_override)
                .unwrap_or_else(|| fallback.to_string())
        };
        let key = || self.config.api_key(&name).ok_or_else(|| Error::api_key(&name));

        let inner: Box<dyn LLMProvider> = match name.as_str() {
            "mock" => {
                debug!("Using offline mock provider");
                return Ok(Box::new(MockProvider::new()));
            }
            "openai" => {
                let mut provider = OpenAIProvider::new(key()?, model(openai::DEFAULT_MODEL))
                    .with_options(options);
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Box::new(provider)
            }
            "google" => {
                let mut provider = GoogleProvider::new(key()?, model(google::DEFAULT_MODEL))
                    .with_options(options);
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Box::new(provider)
            }
            "anthropic" => {
                let mut provider = AnthropicProvider::new(key()?, model(anthropic::DEFAULT_MODEL))
                    .with_options(options);
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                Box::new(provider)
            }
            "ollama" => Box::new(
                OllamaProvider::new(
                    endpoint.unwrap_or_else(|| ollama::DEFAULT_ENDPOINT.to_string()),
                    model(ollama::DEFAULT_MODEL),
                )
                .with_options(options),
            ),
            other => return Err(Error::config(format!("Unknown provider: {}", other))),
        };

        info!("Using provider '{}' with model '{}'", inner.name(), inner.model());
        let retry = self.config.retry;
        Ok(Box::new(RetryingProvider::new(inner, retry.attempts, retry.delay())))
    }

    /// Availability and models of every supported provider
    pub async fn describe_providers(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(SUPPORTED_PROVIDERS.len());
        for name in SUPPORTED_PROVIDERS {
            let model = self.config.model_for(name, None).unwrap_or_default();
            let status = match self.create_provider(Some(*name), None) {
                Ok(provider) => match provider.list_models().await {
                    Ok(models) => ProviderStatus {
                        name: name.to_string(),
                        model,
                        available: true,
                        models,
                        note: None,
                    },
                    Err(e) => ProviderStatus {
                        name: name.to_string(),
                        model,
                        available: true,
                        models: Vec::new(),
                        note: Some(e.to_string()),
                    },
                },
                Err(e) => ProviderStatus {
                    name: name.to_string(),
                    model,
                    available: false,
                    models: Vec::new(),
                    note: Some(e.to_string()),
                },
            };
            statuses.push(status);
        }
        statuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_keys() -> AIConfig {
        let mut config = AIConfig::default();
        for provider in config.providers.values_mut() {
            if provider.api_key.is_some() {
                provider.api_key = Some(String::new());
            }
        }
        config
    }

    #[test]
    fn test_mock_is_not_wrapped() {
        let manager = AIManager::new(config_without_keys());
        let provider = manager.create_provider(Some("MOCK"), None).unwrap();
        assert_eq!(provider.name(), "mock");
        assert!(provider.is_offline());
    }

    #[test]
    fn test_missing_key_is_api_key_error() {
        let manager = AIManager::new(config_without_keys());
        for name in ["openai", "google", "anthropic"] {
            match manager.create_provider(Some(name), None) {
                Err(Error::ApiKey { provider }) => assert_eq!(provider, name),
                other => panic!("expected ApiKey error for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_unknown_provider_lists_supported() {
        let manager = AIManager::new(config_without_keys());
        let err = manager.create_provider(Some("deepseek"), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("openai, google, anthropic, ollama, mock"));
    }

    #[test]
    fn test_model_override_and_retry_wrapping() {
        let mut config = config_without_keys();
        config.providers.get_mut("openai").unwrap().api_key = Some("sk-test".to_string());
        let manager = AIManager::new(config);

        let provider = manager.create_provider(Some("openai"), Some("gpt-4-turbo")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4-turbo");
        assert!(format!("{:?}", provider).starts_with("RetryingProvider"));
    }

    #[test]
    fn test_disabled_provider() {
        let mut config = config_without_keys();
        config.providers.get_mut("ollama").unwrap().enabled = false;
        let manager = AIManager::new(config);
        assert!(matches!(
            manager.create_provider(Some("ollama"), None),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_describe_providers_offline() {
        let mut config = config_without_keys();
        config.providers.get_mut("ollama").unwrap().enabled = false;
        let statuses = AIManager::new(config).describe_providers().await;
        assert_eq!(statuses.len(), SUPPORTED_PROVIDERS.len());

        let mock = statuses.iter().find(|s| s.name == "mock").unwrap();
        assert!(mock.available);
        assert_eq!(mock.models.len(), 1);

        let openai = statuses.iter().find(|s| s.name == "openai").unwrap();
        assert!(!openai.available);
        assert!(openai.note.as_deref().unwrap_or_default().contains("API key"));
    }
}
