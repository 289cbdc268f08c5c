//! JSON Schema descriptors for structured generation
//!
//! Backends never see Rust types. They receive a [`SchemaSpec`]: the schema
//! name plus a draft-07 JSON Schema with every subschema inlined, which is the
//! form the schema-native APIs accept.

use crate::error::{Error, Result};
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::providers::LLMProvider;

/// Named JSON Schema handed to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    /// Schema identity, e.g. `PresentationOutline`
    pub name: String,
    /// Inlined JSON Schema document
    pub schema: Value,
}

impl SchemaSpec {
    /// Derive the descriptor for `T`
    pub fn of<T: JsonSchema>() -> Self {
        let generator = SchemaSettings::draft07()
            .with(|s| s.inline_subschemas = true)
            .into_generator();
        let root = generator.into_root_schema_for::<T>();
        let mut schema = serde_json::to_value(&root).unwrap_or_default();
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
            map.remove("definitions");
        }
        Self {
            name: T::schema_name(),
            schema,
        }
    }

    /// Top-level required property names
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Required fields missing from `value`
    pub fn missing_fields(&self, value: &Value) -> Vec<String> {
        let Some(object) = value.as_object() else {
            return self.required().iter().map(|f| f.to_string()).collect();
        };
        self.required()
            .into_iter()
            .filter(|field| !object.contains_key(*field))
            .map(str::to_string)
            .collect()
    }

    /// Compact rendering used inside prompts
    pub fn to_prompt_string(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_else(|_| self.schema.to_string())
    }
}

/// Ask `provider` for an instance of `T`
///
/// A value that does not deserialize into `T` is reported as a content
/// generation error, never as a transport error.
pub async fn generate_structure<T>(
    provider: &dyn LLMProvider,
    prompt: &str,
    system_prompt: &str,
) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let spec = SchemaSpec::of::<T>();
    tracing::debug!(
        "Requesting structured output '{}' from {}",
        spec.name,
        provider.name()
    );
    let value = provider.generate_json(prompt, &spec, system_prompt).await?;
    serde_json::from_value(value).map_err(|e| {
        Error::content_generation(
            provider.name(),
            format!("response does not match schema '{}': {}", spec.name, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PresentationOutline, SlideConfig};

    #[test]
    fn test_outline_schema_is_inlined() {
        let spec = SchemaSpec::of::<PresentationOutline>();
        assert_eq!(spec.name, "PresentationOutline");
        assert!(spec.schema.get("$schema").is_none());
        assert_eq!(spec.required(), vec!["sections", "title"]);
        let sections = &spec.schema["properties"]["sections"]["items"];
        assert_eq!(sections["type"], "object");
    }

    #[test]
    fn test_missing_fields() {
        let spec = SchemaSpec::of::<SlideConfig>();
        let partial = serde_json::json!({ "title": "Only a title" });
        assert_eq!(spec.missing_fields(&partial), vec!["bullets".to_string()]);
        assert!(!spec.missing_fields(&Value::Null).is_empty());
    }
}
