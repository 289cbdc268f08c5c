//! Retry-on-throttle wrapper
//!
//! Only rate-limit errors are retried. Every other failure, including
//! content generation errors, surfaces on the first attempt.

use super::{LLMProvider, ModelInfo};
use crate::ai::schema::SchemaSpec;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default pause between attempts
pub const DEFAULT_DELAY: Duration = Duration::from_secs(60);

/// Wraps a provider and retries calls the backend throttled
#[derive(Debug)]
pub struct RetryingProvider {
    inner: Box<dyn LLMProvider>,
    attempts: u32,
    delay: Duration,
}

impl RetryingProvider {
    /// Wrap `inner` with `attempts` tries spaced by `delay`
    pub fn new(inner: Box<dyn LLMProvider>, attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }

    async fn with_retry<'a, T, F, Fut>(&'a self, mut call: F) -> Result<T>
    where
        F: FnMut(&'a dyn LLMProvider) -> Fut,
        Fut: Future<Output = Result<T>> + 'a,
    {
        let mut attempt = 1;
        loop {
            match call(self.inner.as_ref()).await {
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    // A backend hint wins over the fixed delay.
                    let wait = e.retry_after().map(Duration::from_secs).unwrap_or(self.delay);
                    warn!(
                        "Rate limit hit on {}, retrying in {}s (attempt {}/{})",
                        self.inner.name(),
                        wait.as_secs(),
                        attempt,
                        self.attempts
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    return Err(Error::rate_limit(
                        self.inner.name(),
                        e.retry_after().or(Some(self.delay.as_secs())),
                    ));
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl LLMProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn is_offline(&self) -> bool {
        self.inner.is_offline()
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.with_retry(|p| p.generate_text(prompt, system_prompt)).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        self.with_retry(|p| p.generate_json(prompt, schema, system_prompt))
            .await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.inner.list_models().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Arc<Mutex<u32>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> (Self, Arc<Mutex<u32>>) {
            let calls = Arc::new(Mutex::new(0));
            let scripted = Self {
                replies: Mutex::new(replies.into()),
                calls: calls.clone(),
            };
            (scripted, calls)
        }
    }

    #[async_trait]
    impl LLMProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "scripted-1"
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn generate_text(&self, _prompt: &str, _system: &str) -> Result<String> {
            *self.calls.lock() += 1;
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("done".to_string()))
        }
        async fn generate_json(&self, _p: &str, _s: &SchemaSpec, _sys: &str) -> Result<Value> {
            *self.calls.lock() += 1;
            Err(Error::content_generation("scripted", "garbage"))
        }
        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let (inner, calls) = Scripted::new(vec![
            Err(Error::rate_limit("scripted", None)),
            Err(Error::rate_limit("scripted", Some(1))),
            Ok("third time".to_string()),
        ]);
        let provider = RetryingProvider::new(Box::new(inner), 3, Duration::from_secs(60));
        assert_eq!(provider.generate_text("p", "").await.unwrap(), "third time");
        assert_eq!(*calls.lock(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_surface_rate_limit() {
        let (inner, calls) = Scripted::new(vec![
            Err(Error::rate_limit("scripted", None)),
            Err(Error::rate_limit("scripted", None)),
        ]);
        let provider = RetryingProvider::new(Box::new(inner), 2, Duration::from_secs(60));
        match provider.generate_text("p", "").await {
            Err(Error::RateLimit { provider, retry_after }) => {
                assert_eq!(provider, "scripted");
                assert_eq!(retry_after, Some(60));
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert_eq!(*calls.lock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrapped_rate_limit_is_retried_with_hint() {
        let (inner, calls) = Scripted::new(vec![
            Err(Error::rate_limit("scripted", Some(5)).context("streaming reply")),
            Ok("after hint".to_string()),
        ]);
        let provider = RetryingProvider::new(Box::new(inner), 2, Duration::from_secs(60));
        let started = tokio::time::Instant::now();
        assert_eq!(provider.generate_text("p", "").await.unwrap(), "after hint");
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(60));
        assert_eq!(*calls.lock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_errors_are_not_retried() {
        let (inner, calls) = Scripted::new(vec![]);
        let provider = RetryingProvider::new(Box::new(inner), 3, Duration::from_secs(60));
        let spec = SchemaSpec::of::<crate::types::StatisticData>();
        let err = provider.generate_json("p", &spec, "").await.unwrap_err();
        assert!(matches!(err, Error::ContentGeneration { .. }));
        assert_eq!(*calls.lock(), 1);
    }
}
