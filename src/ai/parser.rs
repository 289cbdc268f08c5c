//! Response parser for LLM output
//!
//! Backends without native schema support tend to wrap JSON in markdown
//! fences or surround it with prose. The parser strips that noise and hands
//! back the first complete JSON value.

use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use serde_json::Value;

/// Parser for LLM responses that should contain JSON
#[derive(Debug)]
pub struct ResponseParser {
    /// Opening fence, e.g. "```json"
    fence_start: Regex,
    /// Closing fence
    fence_end: Regex,
}

impl ResponseParser {
    /// Create a new ResponseParser with compiled regexes
    pub fn new() -> Self {
        Self {
            fence_start: Regex::new(r"^\s*```[\w-]*\s*\n?").expect("valid fence regex"),
            fence_end: Regex::new(r"\n?\s*```\s*$").expect("valid fence regex"),
        }
    }

    /// Remove a surrounding markdown code fence, if any
    pub fn strip_fences<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let trimmed = text.trim();
        if !trimmed.starts_with("```") {
            return Cow::Borrowed(trimmed);
        }
        let without_start = self.fence_start.replace(trimmed, "");
        let without_end = self.fence_end.replace(&without_start, "");
        Cow::Owned(without_end.trim().to_string())
    }

    /// Parse the JSON object carried by `response`
    ///
    /// Tries the fence-stripped text as a whole first, then falls back to the
    /// first balanced `{ ... }` span.
    pub fn extract_json(&self, provider: &str, response: &str) -> Result<Value> {
        tracing::trace!("Raw response: {}", response);
        let cleaned = self.strip_fences(response);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok(value);
        }

        let candidate = first_object(&cleaned).ok_or_else(|| {
            Error::content_generation(provider, "response contains no JSON object")
        })?;
        serde_json::from_str(candidate).map_err(|e| {
            Error::content_generation(provider, format!("response is not valid JSON: {}", e))
        })
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First balanced object literal, string-aware
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let parser = ResponseParser::new();
        assert_eq!(parser.strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(parser.strip_fences("```\n{}\n```  "), "{}");
        assert_eq!(parser.strip_fences("  {\"plain\": true} "), "{\"plain\": true}");
    }

    #[test]
    fn test_extract_json_with_prose() {
        let parser = ResponseParser::new();
        let response = "Here is the outline you asked for:\n{\"title\": \"Deck {1}\", \"sections\": []}\nHope it helps!";
        let value = parser.extract_json("anthropic", response).unwrap();
        assert_eq!(value["title"], "Deck {1}");
    }

    #[test]
    fn test_extract_json_failure_is_content_error() {
        let parser = ResponseParser::new();
        let err = parser.extract_json("anthropic", "I cannot help with that.").unwrap_err();
        assert!(matches!(err, Error::ContentGeneration { .. }));
    }
}
