//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use autoppt::ai::{LLMProvider, MockProvider, ModelInfo, SchemaSpec};
use autoppt::error::{Error, Result};
use autoppt::generator::{Generator, GeneratorSettings};
use autoppt::render::{DeckDocument, DeckHandle, MemoryDocument};
use autoppt::research::{ImageResult, Researcher, SearchResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Settings without pacing
pub fn fast_settings() -> GeneratorSettings {
    GeneratorSettings::default().with_pacing_delay(Duration::ZERO)
}

/// Generator rendering into one [`MemoryDocument`]; the handle sees every slide
pub fn memory_generator(
    llm: Box<dyn LLMProvider>,
    researcher: Box<dyn Researcher>,
) -> (Generator, DeckHandle) {
    let document = MemoryDocument::new();
    let handle = document.handle();
    let slot = Mutex::new(Some(document));
    let generator = Generator::new(llm, researcher, fast_settings()).with_document_factory(
        Box::new(move || -> Box<dyn DeckDocument> {
            Box::new(slot.lock().take().unwrap_or_default())
        }),
    );
    (generator, handle)
}

/// Call counters shared between a test and its [`CountingResearcher`]
#[derive(Debug, Default)]
pub struct ResearchCalls {
    pub searches: AtomicUsize,
    pub image_searches: AtomicUsize,
    pub downloads: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl ResearchCalls {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.searches() + self.image_searches.load(Ordering::SeqCst) + self.downloads.load(Ordering::SeqCst)
    }
}

/// Researcher returning one canned hit per query and counting every call
#[derive(Debug, Default)]
pub struct CountingResearcher {
    pub calls: Arc<ResearchCalls>,
}

impl CountingResearcher {
    pub fn new() -> (Self, Arc<ResearchCalls>) {
        let calls = Arc::new(ResearchCalls::default());
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl Researcher for CountingResearcher {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        self.calls.searches.fetch_add(1, Ordering::SeqCst);
        self.calls.queries.lock().push(query.to_string());
        Ok(vec![SearchResult {
            title: "Encyclopedia entry".to_string(),
            href: "https://example.org/entry".to_string(),
            body: format!("Background on {}", query),
        }])
    }

    async fn search_images(&self, _query: &str, _max_results: usize) -> Result<Vec<ImageResult>> {
        self.calls.image_searches.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn download_image(&self, url: &str, _dest: &Path, _retries: u32) -> Result<()> {
        self.calls.downloads.fetch_add(1, Ordering::SeqCst);
        Err(Error::research(url, "no images in tests"))
    }
}

/// Offline provider whose slide synthesis fails for one slide topic
#[derive(Debug)]
pub struct FailingSlideProvider {
    inner: MockProvider,
    failing_topic: String,
    failure: fn(&str) -> Error,
}

impl FailingSlideProvider {
    /// Fails the topic's slide with an unusable-output error
    pub fn new(failing_topic: &str) -> Self {
        Self::with_failure(failing_topic, |provider| {
            Error::content_generation(provider, "missing required field: bullets")
        })
    }

    /// Fails the topic's slide with whatever `failure` builds
    pub fn with_failure(failing_topic: &str, failure: fn(&str) -> Error) -> Self {
        Self {
            inner: MockProvider::new(),
            failing_topic: failing_topic.to_string(),
            failure,
        }
    }
}

#[async_trait]
impl LLMProvider for FailingSlideProvider {
    fn name(&self) -> &str {
        "failing-mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_offline(&self) -> bool {
        true
    }

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        self.inner.generate_text(prompt, system_prompt).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        system_prompt: &str,
    ) -> Result<Value> {
        let marker = format!("slide titled '{}'", self.failing_topic);
        if schema.name == "SlideConfig" && prompt.contains(&marker) {
            return Err((self.failure)(self.name()));
        }
        self.inner.generate_json(prompt, schema, system_prompt).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }
}
