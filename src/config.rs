//! Configuration management for AutoPPT

use crate::ai::AIConfig;
use crate::ai::prompt::DEFAULT_CONTEXT_BUDGET;
use crate::error::{Error, Result};
use crate::render::DEFAULT_STYLE;
use crate::research::ResearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// File names probed in the working directory by [`Config::load`]
pub const LOCAL_CONFIG_FILES: &[&str] = &[
    "autoppt.yaml",
    "autoppt.yml",
    "autoppt.toml",
    "autoppt.json",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Deck generation defaults
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Research configuration
    #[serde(default)]
    pub research: ResearchConfig,
    /// AI provider configuration
    #[serde(default)]
    pub ai: AIConfig,
}

impl Config {
    /// Load configuration from file
    ///
    /// `${VAR}` credentials are expanded and the result is validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let mut config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid YAML config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid TOML config: {}", e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid JSON config: {}", e)))?,
            _ => return Err(Error::config("Unsupported config file format")),
        };

        config.ai.expand_env_vars();
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit file, else the first file found among
    /// `./autoppt.{yaml,yml,toml,json}` and `~/.autoppt/config.yaml`,
    /// else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let user_file = dirs::home_dir().map(|home| home.join(".autoppt").join("config.yaml"));
        let candidates = LOCAL_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .chain(user_file);

        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        let mut config = Self::default();
        config.ai.expand_env_vars();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)
                .map_err(|e| Error::config(format!("Failed to serialize to YAML: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize to TOML: {}", e)))?,
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize to JSON: {}", e)))?,
            _ => return Err(Error::config("Unsupported config file format")),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.generation.validate()?;

        if self.research.max_results == 0 {
            return Err(Error::config("research.max_results must be greater than 0"));
        }
        if self.research.search_timeout_secs == 0 {
            return Err(Error::config("research.search_timeout_secs must be greater than 0"));
        }
        if self.research.image_download_timeout_secs == 0 {
            return Err(Error::config(
                "research.image_download_timeout_secs must be greater than 0",
            ));
        }

        self.ai.validate()
    }

    /// Warn when no cloud provider has a credential
    pub fn warn_missing_credentials(&self) {
        if self.ai.configured_cloud_providers().is_empty() {
            warn!(
                "No API key found for openai, google or anthropic. \
                 Set one in .env or use --provider mock / ollama."
            );
        }
    }
}

/// Deck generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Style used when none is requested
    pub default_style: String,
    /// Target slide count
    pub default_slides: usize,
    /// Output language instruction
    pub default_language: String,
    /// Directory for default output paths
    pub output_dir: PathBuf,
    /// Most research characters embedded in a slide prompt
    pub context_char_budget: usize,
    /// Pause before each slide with network providers (seconds)
    pub pacing_delay_secs: u64,
    /// Base directory for the per-run image directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_style: DEFAULT_STYLE.to_string(),
            default_slides: 10,
            default_language: "English".to_string(),
            output_dir: PathBuf::from("output"),
            context_char_budget: DEFAULT_CONTEXT_BUDGET,
            pacing_delay_secs: 60,
            temp_dir: None,
        }
    }
}

impl GenerationConfig {
    /// Pacing delay as a duration
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.default_style.trim().is_empty() {
            return Err(Error::config("generation.default_style must not be empty"));
        }
        if self.default_language.trim().is_empty() {
            return Err(Error::config("generation.default_language must not be empty"));
        }
        if self.default_slides == 0 {
            return Err(Error::config("generation.default_slides must be greater than 0"));
        }
        if self.context_char_budget == 0 {
            return Err(Error::config(
                "generation.context_char_budget must be greater than 0",
            ));
        }
        Ok(())
    }
}
