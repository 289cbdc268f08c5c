//! Research Aggregator
//!
//! Gathers text snippets and images for a slide. Research is best-effort:
//! [`Researcher::gather_context`] never fails, it just returns less context.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub mod web;

pub use web::WebResearcher;

/// One text search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,
    /// Locator used for deduplication and citation
    pub href: String,
    /// Snippet text
    pub body: String,
}

/// One image search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Image title
    pub title: String,
    /// Full-size image URL
    pub image: String,
    /// Thumbnail URL
    pub thumbnail: String,
    /// Page the image comes from
    pub url: String,
}

/// Research settings (`research` section of the config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Text results requested per query
    pub max_results: usize,
    /// Also consult the encyclopedia source
    pub include_secondary: bool,
    /// Per-request timeout for text search and encyclopedia lookups
    pub search_timeout_secs: u64,
    /// Per-request timeout for image downloads
    pub image_download_timeout_secs: u64,
    /// Extra download attempts after the first
    pub image_download_retries: u32,
    /// Instant-answer search API
    pub search_endpoint: String,
    /// Encyclopedia site root
    pub encyclopedia_endpoint: String,
    /// Media repository API
    pub image_endpoint: String,
    /// User-Agent sent with every research request
    pub user_agent: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            include_secondary: true,
            search_timeout_secs: 15,
            image_download_timeout_secs: 30,
            image_download_retries: 2,
            search_endpoint: web::DEFAULT_SEARCH_ENDPOINT.to_string(),
            encyclopedia_endpoint: web::DEFAULT_ENCYCLOPEDIA_ENDPOINT.to_string(),
            image_endpoint: web::DEFAULT_IMAGE_ENDPOINT.to_string(),
            user_agent: concat!("autoppt/", env!("CARGO_PKG_VERSION"), " (presentation generator)")
                .to_string(),
        }
    }
}

/// Source of research material for slides
#[async_trait]
pub trait Researcher: Send + Sync + fmt::Debug {
    /// Text search
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;

    /// Image search
    async fn search_images(&self, query: &str, max_results: usize) -> Result<Vec<ImageResult>>;

    /// Download `url` into `dest`, retrying up to `retries` extra times
    async fn download_image(&self, url: &str, dest: &Path, retries: u32) -> Result<()>;

    /// Encyclopedia summary for `query`, if the source has one
    async fn lookup_secondary(&self, _query: &str) -> Result<Option<SearchResult>> {
        Ok(None)
    }

    /// Text results requested per query by `gather_context`
    fn max_results(&self) -> usize {
        3
    }

    /// Run every query and aggregate the hits into one context blob
    ///
    /// Each hit is rendered as `Source: <title> (<href>)` followed by its
    /// content. Hits are deduplicated by `href` across the whole batch and
    /// failed lookups are skipped.
    async fn gather_context(&self, queries: &[String], include_secondary: bool) -> String {
        let mut context = String::new();
        let mut seen: HashSet<String> = HashSet::new();

        for query in queries {
            let mut hits = match self.search(query, self.max_results()).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Search failed for '{}': {}", query, e);
                    Vec::new()
                }
            };

            if include_secondary {
                match self.lookup_secondary(query).await {
                    Ok(Some(hit)) => hits.push(hit),
                    Ok(None) => {}
                    Err(e) => debug!("Secondary lookup failed for '{}': {}", query, e),
                }
            }

            for hit in hits {
                if hit.body.trim().is_empty() || !seen.insert(hit.href.clone()) {
                    continue;
                }
                context.push_str(&format_hit(&hit));
            }
        }

        context
    }
}

fn format_hit(hit: &SearchResult) -> String {
    format!("Source: {} ({})\nContent: {}\n\n", hit.title, hit.href, hit.body)
}

/// Researcher that finds nothing, for offline runs
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResearcher;

#[async_trait]
impl Researcher for OfflineResearcher {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
        Ok(Vec::new())
    }

    async fn search_images(&self, _query: &str, _max_results: usize) -> Result<Vec<ImageResult>> {
        Ok(Vec::new())
    }

    async fn download_image(&self, url: &str, _dest: &Path, _retries: u32) -> Result<()> {
        Err(crate::error::Error::research(url, "offline mode"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Debug)]
    struct Canned;

    #[async_trait]
    impl Researcher for Canned {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchResult>> {
            if query == "broken" {
                return Err(Error::research(query, "boom"));
            }
            Ok(vec![
                SearchResult {
                    title: "Shared".to_string(),
                    href: "https://example.com/shared".to_string(),
                    body: "Shared body".to_string(),
                },
                SearchResult {
                    title: format!("Only {}", query),
                    href: format!("https://example.com/{}", query),
                    body: format!("About {}", query),
                },
            ])
        }

        async fn search_images(&self, _q: &str, _n: usize) -> Result<Vec<ImageResult>> {
            Ok(Vec::new())
        }

        async fn download_image(&self, _url: &str, _dest: &Path, _retries: u32) -> Result<()> {
            Ok(())
        }

        async fn lookup_secondary(&self, query: &str) -> Result<Option<SearchResult>> {
            Ok(Some(SearchResult {
                title: "Encyclopedia".to_string(),
                href: format!("https://wiki.example/{}", query),
                body: format!("Summary of {}", query),
            }))
        }
    }

    #[tokio::test]
    async fn test_gather_context_dedups_across_queries() {
        let queries = vec!["alpha".to_string(), "beta".to_string()];
        let context = Canned.gather_context(&queries, false).await;

        assert_eq!(context.matches("Source: Shared (https://example.com/shared)").count(), 1);
        assert!(context.contains("Source: Only alpha (https://example.com/alpha)\nContent: About alpha\n\n"));
        assert!(context.contains("Only beta"));
        assert!(!context.contains("Encyclopedia"));
    }

    #[tokio::test]
    async fn test_gather_context_secondary_and_failures() {
        let queries = vec!["broken".to_string(), "gamma".to_string()];
        let context = Canned.gather_context(&queries, true).await;
        assert!(context.contains("Source: Encyclopedia (https://wiki.example/broken)"));
        assert!(context.contains("Summary of gamma"));
        assert!(context.contains("Only gamma"));
    }

    #[tokio::test]
    async fn test_offline_researcher() {
        let context = OfflineResearcher
            .gather_context(&["anything".to_string()], true)
            .await;
        assert!(context.is_empty());
        assert!(OfflineResearcher
            .download_image("https://example.com/a.png", Path::new("/tmp/x"), 1)
            .await
            .is_err());
    }
}
