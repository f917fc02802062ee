//! Intents file model.
//!
//! Two on-disk shapes are accepted:
//! 1. a plain list: `[ {intent, patterns, regex, response}, ... ]`
//! 2. an object: `{"intents": [ ... ]}`
//!
//! `regex` may be a single string or a list of strings. Patterns that are not
//! strings and regexes that fail to compile are skipped with a warning.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::IntentError;

/// One compiled intent.
#[derive(Debug, Clone)]
pub struct Intent {
    pub name: String,
    pub patterns: Vec<String>,
    /// Case-insensitive, searched anywhere in the message
    pub regexes: Vec<Regex>,
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIntent {
    intent: Option<String>,
    patterns: Vec<Value>,
    regex: Option<Value>,
    response: Option<String>,
}

impl RawIntent {
    fn compile(self) -> Intent {
        let name = self.intent.unwrap_or_default();
        let patterns = self
            .patterns
            .into_iter()
            .filter_map(|p| match p {
                Value::String(s) => Some(s),
                other => {
                    tracing::debug!(intent = %name, pattern = %other, "Skipping non-string pattern");
                    None
                }
            })
            .collect();

        let sources: Vec<String> = match self.regex {
            Some(Value::String(s)) => vec![s],
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        };
        let regexes = sources
            .iter()
            .filter_map(|src| compile_regex(&name, src))
            .collect();

        Intent {
            name,
            patterns,
            regexes,
            response: self.response.unwrap_or_default(),
        }
    }
}

fn compile_regex(intent: &str, pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(intent = %intent, pattern = %pattern, error = %e, "Skipping invalid regex");
            None
        }
    }
}

/// Load and compile intents from a JSON file.
pub fn load_intents(path: &Path) -> Result<Vec<Intent>, IntentError> {
    let content = std::fs::read_to_string(path).map_err(|source| IntentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_intents(&content, path)
}

/// Parse intents from JSON text. `origin` is only used in error messages.
pub fn parse_intents(content: &str, origin: &Path) -> Result<Vec<Intent>, IntentError> {
    let raw: Value = serde_json::from_str(content).map_err(|source| IntentError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    let entries = match raw {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("intents") {
            Some(Value::Array(items)) => items,
            _ => return Err(IntentError::Shape(PathBuf::from(origin))),
        },
        _ => return Err(IntentError::Shape(PathBuf::from(origin))),
    };

    let mut intents = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RawIntent>(entry) {
            Ok(raw) => intents.push(raw.compile()),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "Skipping malformed intent entry");
            }
        }
    }
    Ok(intents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PathBuf {
        PathBuf::from("intents.json")
    }

    #[test]
    fn test_parse_plain_list() {
        let json = r#"[
            {"intent": "greet", "patterns": ["hello", "hi"], "response": "Hey!"},
            {"intent": "bye", "patterns": ["bye"], "regex": "see\\s+you", "response": "Later"}
        ]"#;
        let intents = parse_intents(json, &origin()).unwrap();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].name, "greet");
        assert_eq!(intents[0].patterns, vec!["hello", "hi"]);
        assert!(intents[0].regexes.is_empty());
        assert_eq!(intents[1].regexes.len(), 1);
        assert!(intents[1].regexes[0].is_match("SEE   YOU soon"));
    }

    #[test]
    fn test_parse_wrapped_object() {
        let json = r#"{"intents": [{"intent": "hours", "patterns": ["open"], "response": "9-5"}]}"#;
        let intents = parse_intents(json, &origin()).unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].response, "9-5");
    }

    #[test]
    fn test_skips_non_string_patterns_and_bad_regex() {
        let json = r#"[{"intent": "x", "patterns": ["ok", 3, null], "regex": ["(unclosed", "fine"], "response": "r"}]"#;
        let intents = parse_intents(json, &origin()).unwrap();
        assert_eq!(intents[0].patterns, vec!["ok"]);
        assert_eq!(intents[0].regexes.len(), 1);
        assert_eq!(intents[0].regexes[0].as_str(), "fine");
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let err = parse_intents(r#"{"items": []}"#, &origin()).unwrap_err();
        assert!(matches!(err, IntentError::Shape(_)));
        let err = parse_intents("not json", &origin()).unwrap_err();
        assert!(matches!(err, IntentError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_intents(&tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, IntentError::Read { .. }));
    }
}
