//! Defensive JSON extraction from LLM response text.
//!
//! The client asks for provider-native structured output (`json_object`
//! mode), so the whole response usually parses directly. The fenced-block
//! and brace-span scans remain as a compatibility shim for models that wrap
//! their JSON in prose anyway.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonExtractError {
    #[error("No JSON found in response")]
    NoJsonFound,

    #[error("Invalid JSON in response: {0}")]
    Parse(String),
}

fn code_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("static regex"))
}

/// Extract the first JSON object from an LLM response.
///
/// Order: whole response as JSON → fenced code block → first `{` to last `}`.
pub fn extract_json(text: &str) -> Result<serde_json::Value, JsonExtractError> {
    let trimmed = text.trim();

    // Structured-output mode: the response IS the object.
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Ok(value);
        }
    }

    if let Some(captures) = code_block_regex().captures(trimmed) {
        let inner = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        return serde_json::from_str(inner).map_err(|e| JsonExtractError::Parse(e.to_string()));
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            return serde_json::from_str(&trimmed[start..=end])
                .map_err(|e| JsonExtractError::Parse(e.to_string()));
        }
    }

    Err(JsonExtractError::NoJsonFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_json_object() {
        let value = extract_json(r#"{"is_meme": true, "confidence": 85}"#).unwrap();
        assert_eq!(value["is_meme"], true);
        assert_eq!(value["confidence"], 85);
    }

    #[test]
    fn parses_fenced_code_block() {
        let text = "Here is the result:\n```json\n{\"verdict\": \"satire\"}\n```\nDone.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["verdict"], "satire");
    }

    #[test]
    fn parses_fence_without_language_tag() {
        let text = "```\n{\"ok\": 1}\n```";
        assert_eq!(extract_json(text).unwrap()["ok"], 1);
    }

    #[test]
    fn parses_object_embedded_in_prose() {
        let text = "Sure! The answer is {\"confidence\": 42} — hope that helps.";
        assert_eq!(extract_json(text).unwrap()["confidence"], 42);
    }

    #[test]
    fn no_json_at_all_is_typed_error() {
        let err = extract_json("I could not produce a structured answer.").unwrap_err();
        assert!(matches!(err, JsonExtractError::NoJsonFound));
        assert_eq!(err.to_string(), "No JSON found in response");
    }

    #[test]
    fn malformed_json_in_fence_is_parse_error() {
        let err = extract_json("```json\n{invalid json}\n```").unwrap_err();
        assert!(matches!(err, JsonExtractError::Parse(_)));
    }

    #[test]
    fn nested_braces_survive_span_scan() {
        let text = "prefix {\"a\": {\"b\": [1, 2]}} suffix";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"]["b"][1], 2);
    }
}
