//! Web-backed researcher
//!
//! - Text: DuckDuckGo Instant Answer API (abstract plus related topics)
//! - Secondary: Wikipedia search followed by the REST page summary
//! - Images: Wikimedia Commons file search with `imageinfo` URLs

use super::{ImageResult, ResearchConfig, Researcher, SearchResult};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// DuckDuckGo Instant Answer API
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// English Wikipedia
pub const DEFAULT_ENCYCLOPEDIA_ENDPOINT: &str = "https://en.wikipedia.org";

/// Wikimedia Commons action API
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://commons.wikimedia.org/w/api.php";

const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Researcher backed by public web APIs
#[derive(Debug, Clone)]
pub struct WebResearcher {
    config: ResearchConfig,
    client: Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

// Related topics are either a plain entry or a named group of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

#[derive(Deserialize)]
struct WikiSearch {
    query: WikiQuery,
}

#[derive(Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiHit>,
}

#[derive(Deserialize)]
struct WikiHit {
    title: String,
}

#[derive(Deserialize)]
struct WikiSummary {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Deserialize)]
struct PageUrl {
    page: String,
}

#[derive(Deserialize)]
struct CommonsResponse {
    #[serde(default)]
    query: Option<CommonsQuery>,
}

#[derive(Deserialize)]
struct CommonsQuery {
    #[serde(default)]
    pages: HashMap<String, CommonsPage>,
}

#[derive(Deserialize)]
struct CommonsPage {
    #[serde(default)]
    index: u32,
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Deserialize)]
struct ImageInfo {
    url: String,
    #[serde(default)]
    thumburl: Option<String>,
    #[serde(default)]
    descriptionurl: Option<String>,
}

fn flatten_topics(topics: Vec<RelatedTopic>, out: &mut Vec<(String, String)>) {
    for topic in topics {
        match topic {
            RelatedTopic::Entry { text, first_url } => out.push((text, first_url)),
            RelatedTopic::Group { topics } => flatten_topics(topics, out),
        }
    }
}

/// Title part of a related-topic text: "Cargo - the package manager" gives "Cargo"
fn topic_title(text: &str) -> String {
    text.split(" - ")
        .next()
        .unwrap_or(text)
        .chars()
        .take(80)
        .collect()
}

impl WebResearcher {
    /// Create a researcher from settings
    pub fn new(config: ResearchConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.search_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self { config, client }
    }

    /// Settings in use
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    fn url(&self, base: &str, query: &str) -> Result<Url> {
        Url::parse(base).map_err(|e| Error::research(query, format!("bad endpoint '{}': {}", base, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::research(query, format!("HTTP {}", response.status())));
        }
        Ok(response.json().await?)
    }

    async fn try_download(&self, url: &str, dest: &Path) -> Result<()> {
        // Downloads get their own budget; the client default covers API calls.
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.image_download_timeout_secs.max(1)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::research(url, format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::research(url, "empty image body"));
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

impl Default for WebResearcher {
    fn default() -> Self {
        Self::new(ResearchConfig::default())
    }
}

#[async_trait]
impl Researcher for WebResearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        info!("Searching for: {}", query);
        let mut url = self.url(&self.config.search_endpoint, query)?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");

        let answer: InstantAnswer = self.get_json(url, query).await?;
        let mut results = Vec::new();

        if !answer.abstract_text.trim().is_empty() {
            results.push(SearchResult {
                title: if answer.heading.is_empty() { query.to_string() } else { answer.heading },
                href: answer.abstract_url,
                body: answer.abstract_text,
            });
        }

        let mut related = Vec::new();
        flatten_topics(answer.related_topics, &mut related);
        results.extend(
            related
                .into_iter()
                .filter(|(text, url)| !text.is_empty() && !url.is_empty())
                .map(|(text, url)| SearchResult {
                    title: topic_title(&text),
                    href: url,
                    body: text,
                }),
        );

        results.truncate(max_results);
        debug!("{} results for '{}'", results.len(), query);
        Ok(results)
    }

    async fn search_images(&self, query: &str, max_results: usize) -> Result<Vec<ImageResult>> {
        info!("Searching images for: {}", query);
        let mut url = self.url(&self.config.image_endpoint, query)?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("generator", "search")
            .append_pair("gsrsearch", &format!("filetype:bitmap {}", query))
            .append_pair("gsrnamespace", "6")
            .append_pair("gsrlimit", &max_results.max(1).to_string())
            .append_pair("prop", "imageinfo")
            .append_pair("iiprop", "url")
            .append_pair("iiurlwidth", "320");

        let response: CommonsResponse = self.get_json(url, query).await?;
        let mut pages: Vec<CommonsPage> = response
            .query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .filter_map(|page| {
                let info = page.imageinfo.into_iter().next()?;
                Some(ImageResult {
                    title: page.title.trim_start_matches("File:").to_string(),
                    thumbnail: info.thumburl.unwrap_or_else(|| info.url.clone()),
                    url: info.descriptionurl.unwrap_or_else(|| info.url.clone()),
                    image: info.url,
                })
            })
            .take(max_results)
            .collect())
    }

    async fn download_image(&self, url: &str, dest: &Path, retries: u32) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.try_download(url, dest).await {
                Ok(()) => {
                    debug!("Downloaded image {} to {}", url, dest.display());
                    return Ok(());
                }
                Err(e) if attempt < retries => {
                    debug!("Image download attempt {} failed for {}: {}", attempt + 1, url, e);
                    attempt += 1;
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn lookup_secondary(&self, query: &str) -> Result<Option<SearchResult>> {
        let base = self.config.encyclopedia_endpoint.trim_end_matches('/');

        let mut search = self.url(&format!("{}/w/api.php", base), query)?;
        search
            .query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", query)
            .append_pair("srlimit", "1")
            .append_pair("format", "json");
        let found: WikiSearch = self.get_json(search, query).await?;
        let Some(hit) = found.query.search.into_iter().next() else {
            return Ok(None);
        };

        let mut summary_url = self.url(base, query)?;
        summary_url
            .path_segments_mut()
            .map_err(|_| Error::research(query, "encyclopedia endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(["api", "rest_v1", "page", "summary", hit.title.as_str()]);
        let summary: WikiSummary = self.get_json(summary_url, query).await?;

        if summary.extract.trim().is_empty() {
            return Ok(None);
        }
        let href = summary
            .content_urls
            .map(|c| c.desktop.page)
            .unwrap_or_else(|| format!("{}/wiki/{}", base, summary.title.replace(' ', "_")));
        Ok(Some(SearchResult {
            title: summary.title,
            href,
            body: summary.extract,
        }))
    }

    fn max_results(&self) -> usize {
        self.config.max_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn researcher_for(server: &MockServer) -> WebResearcher {
        WebResearcher::new(ResearchConfig {
            search_endpoint: format!("{}/ddg", server.uri()),
            encyclopedia_endpoint: server.uri(),
            image_endpoint: format!("{}/commons", server.uri()),
            ..ResearchConfig::default()
        })
    }

    #[tokio::test]
    async fn test_search_flattens_related_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ddg"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Heading": "Rust",
                "AbstractText": "Rust is a systems programming language.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
                "RelatedTopics": [
                    { "Text": "Cargo - the Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo" },
                    { "Name": "See also", "Topics": [
                        { "Text": "Ferris - the mascot", "FirstURL": "https://duckduckgo.com/Ferris" }
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let results = researcher_for(&server).search("rust language", 5).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[1].title, "Cargo");
        assert_eq!(results[2].href, "https://duckduckgo.com/Ferris");

        let limited = researcher_for(&server).search("rust language", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_secondary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "search": [{ "title": "Solar power" }] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Solar%20power"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Solar power",
                "extract": "Solar power is the conversion of energy from sunlight into electricity.",
                "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Solar_power" } }
            })))
            .mount(&server)
            .await;

        let hit = researcher_for(&server)
            .lookup_secondary("solar energy")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.href, "https://en.wikipedia.org/wiki/Solar_power");
        assert!(hit.body.starts_with("Solar power is"));
    }

    #[tokio::test]
    async fn test_search_images_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commons"))
            .and(query_param("generator", "search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": {
                    "22": { "index": 2, "title": "File:Second.jpg", "imageinfo": [{ "url": "https://img/2.jpg" }] },
                    "11": { "index": 1, "title": "File:First.jpg", "imageinfo": [{
                        "url": "https://img/1.jpg", "thumburl": "https://img/1-thumb.jpg",
                        "descriptionurl": "https://commons/File:First.jpg"
                    }] }
                }}
            })))
            .mount(&server)
            .await;

        let images = researcher_for(&server).search_images("solar farm", 2).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].title, "First.jpg");
        assert_eq!(images[0].thumbnail, "https://img/1-thumb.jpg");
        assert_eq!(images[1].thumbnail, "https://img/2.jpg");
    }

    #[tokio::test]
    async fn test_download_image_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("img.png");
        let result = researcher_for(&server)
            .download_image(&format!("{}/missing.png", server.uri()), &dest, 2)
            .await;
        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_image_writes_file() {
        let server = MockServer::start().await;
        let png = crate::render::image::tests::tiny_png(2, 2);
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("img.png");
        researcher_for(&server)
            .download_image(&format!("{}/ok.png", server.uri()), &dest, 0)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), png);
    }

    #[tokio::test]
    async fn test_search_and_download_use_separate_timeouts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ddg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "AbstractText": "late" }))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let researcher = WebResearcher::new(ResearchConfig {
            search_endpoint: format!("{}/ddg", server.uri()),
            search_timeout_secs: 1,
            image_download_timeout_secs: 10,
            ..ResearchConfig::default()
        });

        assert!(researcher.search("slow topic", 3).await.is_err());

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("slow.png");
        researcher
            .download_image(&format!("{}/slow.png", server.uri()), &dest, 0)
            .await
            .unwrap();
        assert!(dest.exists());
    }
}
