//! Error types for AutoPPT
//!
//! One error enum covers the whole pipeline. Callers decide what to do with
//! a failure by its category: configuration and credential failures found
//! while setting up stop a run, rate limits are retried, and any failure while
//! building a slide becomes a placeholder slide.

use std::io;
use thiserror::Error;

/// Result type alias for AutoPPT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for AutoPPT
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (bad config file, unknown provider, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or rejected credential for a provider
    #[error("API key for '{provider}' is missing or invalid. Please check your .env file.")]
    ApiKey {
        /// Provider name
        provider: String,
    },

    /// Backend throttled the request and local retries are exhausted
    #[error("Rate limit exceeded for '{provider}'. {}", retry_advice(.retry_after))]
    RateLimit {
        /// Provider name
        provider: String,
        /// Suggested wait in seconds
        retry_after: Option<u64>,
    },

    /// Backend answered, but the answer does not fit the requested schema
    #[error("Content generation failed for '{provider}': {reason}")]
    ContentGeneration {
        /// Provider name
        provider: String,
        /// What was wrong with the output
        reason: String,
    },

    /// Requested model is unknown to the backend
    #[error("Model '{model}' not found for provider '{provider}'")]
    ModelNotFound {
        /// Model identifier
        model: String,
        /// Provider name
        provider: String,
    },

    /// Backend reachable but returned a failure
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Research lookup failed
    #[error("Research failed for '{query}': {reason}")]
    Research {
        /// Search query
        query: String,
        /// Failure reason
        reason: String,
    },

    /// Rendering a slide or the document failed
    #[error("Render error during {operation}: {reason}")]
    Render {
        /// Render operation
        operation: String,
        /// Failure reason
        reason: String,
    },

    /// Chart categories and values disagree
    #[error("Invalid chart data: {categories} categories but {values} values")]
    InvalidChartData {
        /// Number of categories
        categories: usize,
        /// Number of values
        values: usize,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Archive writing error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// Error context
        context: String,
        /// Source error
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Create a missing-credential error
    pub fn api_key<S: Into<String>>(provider: S) -> Self {
        Error::ApiKey {
            provider: provider.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(provider: S, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            provider: provider.into(),
            retry_after,
        }
    }

    /// Create a content generation error
    pub fn content_generation<S: Into<String>, R: Into<String>>(provider: S, reason: R) -> Self {
        Error::ContentGeneration {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider error
    pub fn provider<S: Into<String>, M: Into<String>>(provider: S, message: M) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a research error
    pub fn research<Q: Into<String>, R: Into<String>>(query: Q, reason: R) -> Self {
        Error::Research {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a render error
    pub fn render<O: Into<String>, R: Into<String>>(operation: O, reason: R) -> Self {
        Error::Render {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Strip context wrappers and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if error is a configuration or credential problem
    pub fn is_configuration(&self) -> bool {
        matches!(self.root(), Error::Config(_) | Error::ApiKey { .. })
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), Error::RateLimit { .. })
    }

    /// Wait suggested by the backend, if it gave one
    pub fn retry_after(&self) -> Option<u64> {
        match self.root() {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

fn retry_advice(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!("Please retry after {} seconds.", secs),
        None => "Please wait and try again later.".to_string(),
    }
}

/// Trait for adding context to results
pub trait ResultExt<T> {
    /// Add context to the error
    fn context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (only called on error)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = Error::Validation("topic must not be empty".to_string());
        let err_with_context = err.context("starting generation");
        assert!(matches!(err_with_context, Error::WithContext { .. }));
        assert!(matches!(err_with_context.root(), Error::Validation(_)));
    }

    #[test]
    fn test_api_key_message_names_provider() {
        let err = Error::api_key("openai");
        assert_eq!(
            err.to_string(),
            "API key for 'openai' is missing or invalid. Please check your .env file."
        );
        assert!(err.is_configuration());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_message_and_retry() {
        let err = Error::rate_limit("anthropic", Some(30));
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded for 'anthropic'. Please retry after 30 seconds."
        );
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(30));

        let wrapped = Error::rate_limit("google", None).context("generating outline");
        assert!(wrapped.is_retryable());
        assert_eq!(wrapped.retry_after(), None);
        assert_eq!(
            wrapped.to_string(),
            "generating outline: Rate limit exceeded for 'google'. Please wait and try again later."
        );
    }

    #[test]
    fn test_content_generation_is_not_retryable() {
        let err = Error::content_generation("anthropic", "missing field `title`");
        assert!(!err.is_retryable());
        assert!(!err.is_configuration());
    }
}
