//! Structured records exchanged between the generation service, the
//! orchestrator and the renderer.
//!
//! Field doc comments double as schema descriptions: they are carried into
//! the JSON Schema sent to schema-aware backends.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout hint produced by slide synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    /// Title plus bullet list, optionally with a side image
    #[default]
    Content,
    /// Native chart built from `chart_data`
    Chart,
    /// Up to four large figures with labels
    Statistics,
    /// Fullscreen picture with overlay title
    Image,
}

impl std::fmt::Display for SlideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlideType::Content => write!(f, "content"),
            SlideType::Chart => write!(f, "chart"),
            SlideType::Statistics => write!(f, "statistics"),
            SlideType::Image => write!(f, "image"),
        }
    }
}

/// Supported chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Horizontal bars
    Bar,
    /// Pie slices
    Pie,
    /// Line series
    Line,
    /// Vertical bars
    Column,
}

/// Data for a chart slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartData {
    /// Type of chart: bar, pie, line, or column
    pub chart_type: ChartType,
    /// Chart title
    pub title: String,
    /// Category labels for the X-axis or pie slices
    pub categories: Vec<String>,
    /// Numeric values corresponding to each category
    pub values: Vec<f64>,
    /// Name of the data series
    #[serde(default = "default_series_name")]
    pub series_name: String,
}

fn default_series_name() -> String {
    "Series 1".to_string()
}

impl ChartData {
    /// Check that every category has exactly one value
    pub fn validate(&self) -> Result<()> {
        if self.categories.len() != self.values.len() {
            return Err(Error::InvalidChartData {
                categories: self.categories.len(),
                values: self.values.len(),
            });
        }
        if self.categories.is_empty() {
            return Err(Error::Validation("chart has no categories".to_string()));
        }
        if let Some(bad) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(Error::Validation(format!("chart value {} is not finite", bad)));
        }
        Ok(())
    }
}

/// A single headline figure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatisticData {
    /// The statistic value to display, e.g. '85%' or '$1.2M'
    pub value: String,
    /// Short description of what the value measures
    pub label: String,
}

/// Synthesized content for one slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SlideConfig {
    /// The main title of the slide
    pub title: String,
    /// Layout type: content, chart, statistics, or image
    #[serde(default)]
    pub slide_type: SlideType,
    /// Bullet points, most important first
    pub bullets: Vec<String>,
    /// A specific search query to find an image for this slide
    #[serde(default)]
    pub image_query: Option<String>,
    /// Speaker notes for this slide
    #[serde(default)]
    pub speaker_notes: Option<String>,
    /// Source URLs or references used for this slide
    #[serde(default)]
    pub citations: Vec<String>,
    /// Chart data, used when slide_type is chart
    #[serde(default)]
    pub chart_data: Option<ChartData>,
    /// Headline statistics, used when slide_type is statistics
    #[serde(default)]
    pub statistics: Option<Vec<StatisticData>>,
}

impl SlideConfig {
    /// Create a plain content slide
    pub fn content(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            slide_type: SlideType::Content,
            bullets,
            image_query: None,
            speaker_notes: None,
            citations: Vec::new(),
            chart_data: None,
            statistics: None,
        }
    }

    /// Statistics that are actually present
    pub fn statistics(&self) -> &[StatisticData] {
        self.statistics.as_deref().unwrap_or_default()
    }

    /// Image query, if set to something searchable
    pub fn image_query(&self) -> Option<&str> {
        self.image_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// A chapter of the presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PresentationSection {
    /// Title of the section or chapter
    pub title: String,
    /// Slide topics within this section
    pub slides: Vec<String>,
}

/// Hierarchical plan of the whole deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PresentationOutline {
    /// Main title of the presentation
    pub title: String,
    /// Ordered sections, each with its slide topics
    pub sections: Vec<PresentationSection>,
}

impl PresentationOutline {
    /// Number of body slides the outline calls for
    pub fn total_slides(&self) -> usize {
        self.sections.iter().map(|s| s.slides.len()).sum()
    }

    /// Reject outlines that would render nothing
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("outline title is empty".to_string()));
        }
        if self.sections.is_empty() {
            return Err(Error::Validation("outline has no sections".to_string()));
        }
        Ok(())
    }
}

/// User-authored deck structure, loaded from a YAML or JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresentation {
    /// Deck title
    pub title: String,
    /// Sections with slide topics
    pub sections: Vec<PresentationSection>,
}

impl UserPresentation {
    /// Load from `.yaml`, `.yml` or `.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let presentation = match ext {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            _ => {
                return Err(Error::config(format!(
                    "Unsupported outline format: {}",
                    path.display()
                )))
            }
        };
        Ok(presentation)
    }
}

impl From<UserPresentation> for PresentationOutline {
    fn from(user: UserPresentation) -> Self {
        Self {
            title: user.title,
            sections: user.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_config_defaults() {
        let slide: SlideConfig =
            serde_json::from_str(r#"{"title": "Overview", "bullets": ["one", "two"]}"#).unwrap();
        assert_eq!(slide.slide_type, SlideType::Content);
        assert!(slide.citations.is_empty());
        assert!(slide.statistics().is_empty());
        assert!(slide.image_query().is_none());
    }

    #[test]
    fn test_blank_image_query_is_ignored() {
        let mut slide = SlideConfig::content("Overview", vec![]);
        slide.image_query = Some("   ".to_string());
        assert!(slide.image_query().is_none());
        slide.image_query = Some(" solar farm ".to_string());
        assert_eq!(slide.image_query(), Some("solar farm"));
    }

    #[test]
    fn test_chart_data_length_mismatch() {
        let chart: ChartData = serde_json::from_str(
            r#"{"chart_type": "pie", "title": "Share", "categories": ["a", "b", "c"], "values": [1.0, 2.0]}"#,
        )
        .unwrap();
        assert_eq!(chart.series_name, "Series 1");
        assert!(matches!(
            chart.validate(),
            Err(Error::InvalidChartData {
                categories: 3,
                values: 2
            })
        ));
    }

    #[test]
    fn test_outline_total_slides() {
        let outline = PresentationOutline {
            title: "Deck".to_string(),
            sections: vec![
                PresentationSection {
                    title: "A".to_string(),
                    slides: vec!["a1".to_string(), "a2".to_string()],
                },
                PresentationSection {
                    title: "B".to_string(),
                    slides: vec!["b1".to_string()],
                },
            ],
        };
        assert_eq!(outline.total_slides(), 3);
        assert!(outline.validate().is_ok());
    }

    #[test]
    fn test_user_presentation_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.yaml");
        std::fs::write(
            &path,
            "title: Rust in Production\nsections:\n  - title: Why Rust\n    slides: [Safety, Speed]\n",
        )
        .unwrap();

        let outline: PresentationOutline = UserPresentation::from_file(&path).unwrap().into();
        assert_eq!(outline.title, "Rust in Production");
        assert_eq!(outline.total_slides(), 2);
    }
}
