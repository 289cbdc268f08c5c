//! AI provider configuration
//!
//! The `ai` section of the configuration file. API keys may be written as
//! `${VAR}` and are resolved from the environment (after `.env` loading).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::providers::{anthropic, google, ollama, openai, GenerationOptions};

/// Provider names the factory knows how to build
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "google", "anthropic", "ollama", "mock"];

/// Main AI configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIConfig {
    /// Provider used when none is requested
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Retry policy for throttled requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Provider-specific configurations
    #[serde(default = "AIConfig::default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Retry policy applied to every network provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Pause between attempts when the backend gives no hint
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider may be selected
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API endpoint (for local or custom endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (supports environment variable substitution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name to use
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0-2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_true() -> bool {
    true
}

fn default_attempts() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    60
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            retry: RetryConfig::default(),
            providers: Self::default_providers(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetryConfig {
    /// Delay as a `Duration`
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl ProviderConfig {
    fn cloud(env_var: &str, model: &str) -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_key: Some(format!("${{{}}}", env_var)),
            model: model.to_string(),
            max_tokens: Some(4096),
            temperature: Some(0.7),
            timeout_secs: Some(120),
        }
    }

    /// Generation options derived from this entry
    pub fn generation_options(&self) -> GenerationOptions {
        let defaults = GenerationOptions::default();
        GenerationOptions {
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .or(defaults.timeout),
        }
    }
}

/// Resolve a `${VAR}` reference against the environment
fn expand(value: &str) -> Option<String> {
    let value = value.trim();
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var) => std::env::var(var).ok().filter(|v| !v.trim().is_empty()),
        None if value.is_empty() => None,
        None => Some(value.to_string()),
    }
}

impl AIConfig {
    /// Create default provider configurations
    pub fn default_providers() -> HashMap<String, ProviderConfig> {
        let mut providers = HashMap::new();

        providers.insert(
            "openai".to_string(),
            ProviderConfig::cloud("OPENAI_API_KEY", openai::DEFAULT_MODEL),
        );
        providers.insert(
            "google".to_string(),
            ProviderConfig::cloud("GOOGLE_API_KEY", google::DEFAULT_MODEL),
        );
        providers.insert(
            "anthropic".to_string(),
            ProviderConfig::cloud("ANTHROPIC_API_KEY", anthropic::DEFAULT_MODEL),
        );

        // Local, no API key required
        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                enabled: true,
                endpoint: Some(ollama::DEFAULT_ENDPOINT.to_string()),
                api_key: None,
                model: ollama::DEFAULT_MODEL.to_string(),
                max_tokens: Some(4096),
                temperature: Some(0.7),
                timeout_secs: Some(300),
            },
        );

        providers.insert(
            "mock".to_string(),
            ProviderConfig {
                enabled: true,
                endpoint: None,
                api_key: None,
                model: "mock".to_string(),
                max_tokens: None,
                temperature: None,
                timeout_secs: None,
            },
        );

        providers
    }

    /// Replace `${VAR}` API keys with their environment values where set
    pub fn expand_env_vars(&mut self) {
        for (name, provider) in self.providers.iter_mut() {
            let Some(template) = provider.api_key.as_deref() else {
                continue;
            };
            if template.starts_with("${") {
                if let Some(value) = expand(template) {
                    tracing::debug!("Resolved API key for provider '{}' from environment", name);
                    provider.api_key = Some(value);
                }
            }
        }
    }

    /// Get provider configuration by name (case-insensitive)
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        let name = name.to_ascii_lowercase();
        self.providers.get(&name)
    }

    /// Check if a provider is enabled
    pub fn is_provider_enabled(&self, name: &str) -> bool {
        self.get_provider(name).map(|p| p.enabled).unwrap_or(false)
    }

    /// Get the default provider name
    pub fn default_provider_name(&self) -> &str {
        &self.default_provider
    }

    /// Usable credential for `name`, if any
    pub fn api_key(&self, name: &str) -> Option<String> {
        self.get_provider(name)
            .and_then(|p| p.api_key.as_deref())
            .and_then(expand)
    }

    /// Model for `name`, honoring an explicit override
    pub fn model_for(&self, name: &str, model_override: Option<&str>) -> Option<String> {
        model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.get_provider(name).map(|p| p.model.clone()))
    }

    /// Cloud providers that currently have a credential
    pub fn configured_cloud_providers(&self) -> Vec<&'static str> {
        ["openai", "google", "anthropic"]
            .into_iter()
            .filter(|name| self.api_key(name).is_some())
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let default = self.default_provider.to_ascii_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&default.as_str()) {
            return Err(Error::config(format!(
                "Default provider '{}' is not supported. Supported: {}",
                self.default_provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if self.retry.attempts == 0 {
            return Err(Error::config("ai.retry.attempts must be at least 1"));
        }

        for (name, provider) in &self.providers {
            if provider.model.trim().is_empty() {
                return Err(Error::config(format!("Provider '{}' has an empty model", name)));
            }

            if let Some(max_tokens) = provider.max_tokens {
                if max_tokens == 0 || max_tokens > 200_000 {
                    return Err(Error::config(format!(
                        "Provider '{}' has invalid max_tokens: {}. Must be between 1 and 200,000",
                        name, max_tokens
                    )));
                }
            }

            if let Some(temperature) = provider.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(Error::config(format!(
                        "Provider '{}' has invalid temperature: {}. Must be between 0.0 and 2.0",
                        name, temperature
                    )));
                }
            }

            if let Some(timeout) = provider.timeout_secs {
                if timeout == 0 || timeout > 600 {
                    return Err(Error::config(format!(
                        "Provider '{}' has invalid timeout: {}s. Must be between 1 and 600 seconds",
                        name, timeout
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AIConfig::default();
        assert_eq!(config.default_provider_name(), "openai");
        assert_eq!(config.retry, RetryConfig { attempts: 3, delay_secs: 60 });
        assert_eq!(config.get_provider("google").unwrap().model, "gemini-2.0-flash");
        assert_eq!(config.get_provider("OLLAMA").unwrap().model, "llama3.1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_resolution() {
        let mut config = AIConfig::default();
        config.providers.get_mut("openai").unwrap().api_key =
            Some("${AUTOPPT_TEST_UNSET_KEY_8841}".to_string());
        assert_eq!(config.api_key("openai"), None);

        config.providers.get_mut("openai").unwrap().api_key = Some("sk-literal".to_string());
        assert_eq!(config.api_key("openai").as_deref(), Some("sk-literal"));

        config.providers.get_mut("anthropic").unwrap().api_key = Some("  ".to_string());
        assert_eq!(config.api_key("anthropic"), None);
        assert_eq!(config.api_key("mock"), None);
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("AUTOPPT_TEST_GOOGLE_KEY_1193", "g-secret");
        let mut config = AIConfig::default();
        config.providers.get_mut("google").unwrap().api_key =
            Some("${AUTOPPT_TEST_GOOGLE_KEY_1193}".to_string());
        config.expand_env_vars();
        assert_eq!(
            config.get_provider("google").unwrap().api_key.as_deref(),
            Some("g-secret")
        );
    }

    #[test]
    fn test_model_override() {
        let config = AIConfig::default();
        assert_eq!(config.model_for("openai", Some("gpt-4-turbo")).as_deref(), Some("gpt-4-turbo"));
        assert_eq!(config.model_for("openai", Some("  ")).as_deref(), Some("gpt-4o"));
        assert_eq!(config.model_for("nope", None), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AIConfig::default();
        config.retry.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AIConfig::default();
        config.default_provider = "deepseek".to_string();
        assert!(config.validate().is_err());

        let mut config = AIConfig::default();
        config.providers.get_mut("openai").unwrap().temperature = Some(3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generation_options_from_provider() {
        let config = AIConfig::default();
        let options = config.get_provider("ollama").unwrap().generation_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(300)));
        assert_eq!(options.max_tokens, Some(4096));
    }
}
