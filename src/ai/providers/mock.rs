//! Deterministic offline provider
//!
//! Produces plausible content without touching the network so the whole
//! pipeline can run in tests and demos. Known schemas have an explicit
//! builder; anything else is synthesized by walking its JSON Schema.

use super::{LLMProvider, ModelInfo};
use crate::ai::schema::SchemaSpec;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Fallback when the prompt names no topic
pub const DEFAULT_TOPIC: &str = "Current Topic";

const MOCK_TEXT: &str = "This is a high-quality researched content for your presentation. \
It covers the key aspects of the requested topic with depth and clarity, ensuring a \
professional delivery. Citation: [Source 2025]";

/// Builds an instance of one schema for a topic
pub type Builder = fn(&str) -> Value;

/// Offline provider with a per-schema builder registry
#[derive(Debug, Clone)]
pub struct MockProvider {
    builders: HashMap<&'static str, Builder>,
}

impl MockProvider {
    /// Provider with builders for every deck schema
    pub fn new() -> Self {
        let mut builders: HashMap<&'static str, Builder> = HashMap::new();
        builders.insert("PresentationOutline", outline);
        builders.insert("PresentationSection", section);
        builders.insert("SlideConfig", slide);
        builders.insert("ChartData", chart);
        builders.insert("StatisticData", statistic);
        Self { builders }
    }

    /// Register or replace the builder for a schema name
    pub fn with_builder(mut self, schema_name: &'static str, builder: Builder) -> Self {
        self.builders.insert(schema_name, builder);
        self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Topic named by the prompt
///
/// Takes the rest of the line after `topic:` (or after `about` when there is
/// no such marker), matched case-insensitively.
pub fn extract_topic(prompt: &str) -> String {
    // ASCII lowering keeps byte offsets aligned with the original text.
    let lowered = prompt.to_ascii_lowercase();
    let start = lowered
        .find("topic:")
        .map(|i| i + "topic:".len())
        .or_else(|| lowered.find("about").map(|i| i + "about".len()));

    start
        .and_then(|i| prompt[i..].lines().next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TOPIC)
        .to_string()
}

fn bullets(topic: &str) -> Vec<String> {
    vec![
        format!("Key innovation and strategic importance of {topic}"),
        format!("Global impact and future trends in {topic}"),
        format!("Practical applications and case studies of {topic}"),
    ]
}

fn outline(topic: &str) -> Value {
    json!({
        "title": format!("Overview of {topic}"),
        "sections": [
            {
                "title": format!("Fundamentals of {topic}"),
                "slides": [format!("Introduction to {topic}"), format!("Core Concepts of {topic}")]
            },
            {
                "title": format!("Advanced Applications: {topic}"),
                "slides": [format!("Case Study: {topic}"), "Economic Impact"]
            },
            {
                "title": format!("The Future of {topic}"),
                "slides": [format!("Predictions for {topic}"), "Strategic Roadmap"]
            }
        ]
    })
}

fn section(topic: &str) -> Value {
    json!({
        "title": format!("Fundamentals of {topic}"),
        "slides": [format!("Introduction to {topic}"), format!("Core Concepts of {topic}")]
    })
}

fn slide(topic: &str) -> Value {
    json!({
        "title": format!("Overview of {topic}"),
        "slide_type": "content",
        "bullets": bullets(topic),
        "image_query": null,
        "speaker_notes": format!("Comprehensive analysis and professional insight into {topic}."),
        "citations": bullets(topic),
    })
}

fn chart(topic: &str) -> Value {
    json!({
        "chart_type": "column",
        "title": format!("Overview of {topic}"),
        "categories": ["2023", "2024", "2025"],
        "values": [42.0, 58.0, 73.0],
        "series_name": "Series 1"
    })
}

fn statistic(topic: &str) -> Value {
    json!({
        "value": "85%",
        "label": format!("Adoption of {topic}")
    })
}

/// Synthesize a value for an arbitrary schema node
fn synthesize(node: &Value, field: &str, topic: &str) -> Value {
    if let Some(values) = node.get("enum").and_then(Value::as_array) {
        return values.first().cloned().unwrap_or(Value::Null);
    }
    if let Some(constant) = node.get("const") {
        return constant.clone();
    }
    if let Some(first) = ["oneOf", "anyOf", "allOf"]
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_array).and_then(|a| a.first()))
    {
        return synthesize(first, field, topic);
    }

    let kind = match node.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|k| *k != "null")
            .unwrap_or("null"),
        _ => "object",
    };

    match kind {
        "string" => {
            let field = field.to_ascii_lowercase();
            if field.contains("title") {
                json!(format!("Overview of {topic}"))
            } else if field.contains("image_query") {
                json!(format!("professional artistic image of {topic}"))
            } else {
                json!(format!("Comprehensive analysis and professional insight into {topic}."))
            }
        }
        "integer" => json!(1),
        "number" => json!(1.0),
        "boolean" => json!(false),
        "array" => {
            let items = node.get("items").cloned().unwrap_or(json!({ "type": "string" }));
            let is_strings = items.get("type").and_then(Value::as_str) == Some("string");
            if is_strings && items.get("enum").is_none() {
                json!(bullets(topic))
            } else {
                json!([synthesize(&items, field, topic), synthesize(&items, field, topic)])
            }
        }
        "object" => {
            let mut object = Map::new();
            let required: Vec<&str> = node
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            if let Some(properties) = node.get("properties").and_then(Value::as_object) {
                for (name, property) in properties {
                    if required.contains(&name.as_str()) {
                        object.insert(name.clone(), synthesize(property, name, topic));
                    }
                }
            }
            Value::Object(object)
        }
        _ => Value::Null,
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
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

    async fn generate_text(&self, _prompt: &str, _system_prompt: &str) -> Result<String> {
        Ok(MOCK_TEXT.to_string())
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &SchemaSpec,
        _system_prompt: &str,
    ) -> Result<Value> {
        let topic = extract_topic(prompt);
        tracing::debug!("Mock '{}' for topic '{}'", schema.name, topic);
        Ok(match self.builders.get(schema.name.as_str()) {
            Some(build) => build(&topic),
            None => synthesize(&schema.schema, "", &topic),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo::new("mock", "mock").with_name("Deterministic offline model")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::generate_structure;
    use crate::types::{ChartData, PresentationOutline, SlideConfig, SlideType, StatisticData};
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[test]
    fn test_extract_topic() {
        assert_eq!(extract_topic("Create an outline.\nTopic: Artificial Intelligence\nLanguage: English"), "Artificial Intelligence");
        assert_eq!(extract_topic("Write something about renewable energy"), "renewable energy");
        assert_eq!(extract_topic("No marker here"), DEFAULT_TOPIC);
        assert_eq!(extract_topic("TOPIC:   \nrest"), DEFAULT_TOPIC);
    }

    #[tokio::test]
    async fn test_outline_shape() {
        let provider = MockProvider::new();
        let outline: PresentationOutline =
            generate_structure(&provider, "Topic: Artificial Intelligence", "").await.unwrap();
        assert_eq!(outline.sections.len(), 3);
        assert!(outline.sections.iter().all(|s| s.slides.len() >= 2));
        assert_eq!(outline.sections[0].title, "Fundamentals of Artificial Intelligence");
        assert_eq!(outline.sections[1].slides[1], "Economic Impact");
    }

    #[tokio::test]
    async fn test_slide_and_parts_deserialize() {
        let provider = MockProvider::new();
        let slide: SlideConfig = generate_structure(&provider, "Topic: Rust", "").await.unwrap();
        assert_eq!(slide.slide_type, SlideType::Content);
        assert_eq!(slide.bullets.len(), 3);
        assert!(slide.image_query().is_none());
        assert_eq!(slide.citations.len(), 3);

        let chart: ChartData = generate_structure(&provider, "Topic: Rust", "").await.unwrap();
        assert!(chart.validate().is_ok());
        let stat: StatisticData = generate_structure(&provider, "Topic: Rust", "").await.unwrap();
        assert_eq!(stat.label, "Adoption of Rust");
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Agenda {
        headline: String,
        items: Vec<String>,
        speakers: Vec<Speaker>,
        duration_minutes: u32,
        #[allow(dead_code)]
        venue: Option<String>,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Speaker {
        name: String,
        keynote: bool,
    }

    #[tokio::test]
    async fn test_generic_schema_walker() {
        let provider = MockProvider::new();
        let agenda: Agenda = generate_structure(&provider, "about compilers", "").await.unwrap();
        assert!(agenda.headline.contains("compilers"));
        assert_eq!(agenda.items.len(), 3);
        assert_eq!(agenda.speakers.len(), 2);
        assert!(!agenda.speakers[0].name.is_empty());
        assert!(!agenda.speakers[0].keynote);
        assert_eq!(agenda.duration_minutes, 1);
    }

    #[tokio::test]
    async fn test_is_offline() {
        let provider = MockProvider::new();
        assert!(provider.is_offline());
        assert!(provider.generate_text("x", "").await.unwrap().ends_with("Citation: [Source 2025]"));
    }
}
