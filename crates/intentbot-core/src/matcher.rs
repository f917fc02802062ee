//! Intent matching cascade.
//!
//! Stages run in order and the first hit wins:
//! 1. substring — a pattern (lowercased) occurs in the message
//! 2. regex — an intent regex matches anywhere in the message
//! 3. fuzzy — best token-set ratio over all patterns, if ≥ fuzzy threshold
//! 4. TF-IDF — best cosine similarity over all patterns, if ≥ tfidf threshold

use std::path::Path;

use crate::config::MatchConfig;
use crate::error::IntentError;
use crate::fuzzy;
use crate::intents::{load_intents, Intent};
use crate::tfidf::TfidfModel;

/// Reply when no stage matches.
pub const FALLBACK_RESPONSE: &str =
    "Sorry, I didn't get it. Please type an appropriate message.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Substring,
    Regex,
    Fuzzy,
    Tfidf,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Substring => "substring",
            MatchStage::Regex => "regex",
            MatchStage::Fuzzy => "fuzzy",
            MatchStage::Tfidf => "tfidf",
        }
    }
}

/// A successful match: the intent, the stage that produced it and its score
/// (1.0 for substring/regex, 0..=100 for fuzzy, 0..=1 for TF-IDF).
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    pub intent: &'a Intent,
    pub stage: MatchStage,
    pub score: f64,
}

/// Compiled intents plus the fuzzy corpus and TF-IDF model built from them.
#[derive(Debug, Clone)]
pub struct IntentEngine {
    intents: Vec<Intent>,
    /// Lowercased patterns, in intent order
    corpus: Vec<String>,
    /// corpus index → intent name
    pattern_to_intent: Vec<String>,
    tfidf: Option<TfidfModel>,
    config: MatchConfig,
}

impl IntentEngine {
    pub fn new(intents: Vec<Intent>, config: MatchConfig) -> Self {
        let mut corpus = Vec::new();
        let mut pattern_to_intent = Vec::new();
        for intent in &intents {
            for pattern in &intent.patterns {
                corpus.push(pattern.to_lowercase());
                pattern_to_intent.push(intent.name.clone());
            }
        }
        let tfidf = TfidfModel::fit(&corpus);
        tracing::debug!(
            intents = intents.len(),
            patterns = corpus.len(),
            tfidf = tfidf.is_some(),
            "Built intent engine"
        );
        Self {
            intents,
            corpus,
            pattern_to_intent,
            tfidf,
            config,
        }
    }

    /// Load an intents file and build the engine.
    pub fn load(path: &Path, config: MatchConfig) -> Result<Self, IntentError> {
        let intents = load_intents(path)?;
        Ok(Self::new(intents, config))
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn pattern_count(&self) -> usize {
        self.corpus.len()
    }

    /// Match a message; `None` for blank input or when no stage clears its threshold.
    pub fn find_intent(&self, message: &str) -> Option<MatchOutcome<'_>> {
        let text = message.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        for intent in &self.intents {
            if intent
                .patterns
                .iter()
                .any(|p| text.contains(p.to_lowercase().as_str()))
            {
                return Some(MatchOutcome {
                    intent,
                    stage: MatchStage::Substring,
                    score: 1.0,
                });
            }
        }

        for intent in &self.intents {
            if intent.regexes.iter().any(|re| re.is_match(&text)) {
                return Some(MatchOutcome {
                    intent,
                    stage: MatchStage::Regex,
                    score: 1.0,
                });
            }
        }

        if let Some((idx, score)) = fuzzy::best_match(&text, self.corpus.iter().map(String::as_str)) {
            if score >= self.config.fuzzy_threshold {
                if let Some(intent) = self.intent_named(&self.pattern_to_intent[idx]) {
                    return Some(MatchOutcome {
                        intent,
                        stage: MatchStage::Fuzzy,
                        score,
                    });
                }
            }
        }

        if let Some((idx, score)) = self.tfidf.as_ref().and_then(|m| m.best_match(&text)) {
            if score >= self.config.tfidf_threshold {
                if let Some(intent) = self.intent_named(&self.pattern_to_intent[idx]) {
                    return Some(MatchOutcome {
                        intent,
                        stage: MatchStage::Tfidf,
                        score,
                    });
                }
            }
        }

        None
    }

    /// Response text for a message, falling back to [`FALLBACK_RESPONSE`].
    pub fn respond(&self, message: &str) -> String {
        match self.find_intent(message) {
            Some(outcome) => {
                tracing::debug!(
                    intent = %outcome.intent.name,
                    stage = outcome.stage.as_str(),
                    score = outcome.score,
                    "Matched intent"
                );
                outcome.intent.response.clone()
            }
            None => FALLBACK_RESPONSE.to_string(),
        }
    }

    fn intent_named(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::parse_intents;
    use std::path::PathBuf;

    fn engine(json: &str) -> IntentEngine {
        let intents = parse_intents(json, &PathBuf::from("test.json")).unwrap();
        IntentEngine::new(intents, MatchConfig::default())
    }

    const INTENTS: &str = r#"{"intents": [
        {"intent": "greeting", "patterns": ["hello", "good morning"], "response": "Hi there!"},
        {"intent": "order_status", "patterns": ["track my order", "where is my package"],
         "regex": ["order\\s*#?\\d+"], "response": "Let me check your order."},
        {"intent": "hours", "patterns": ["opening hours", "when are you open"],
         "regex": "\\bopen\\b.*\\bsunday", "response": "We are open 9 to 5."}
    ]}"#;

    #[test]
    fn test_blank_message_has_no_match() {
        let e = engine(INTENTS);
        assert!(e.find_intent("   ").is_none());
        assert_eq!(e.respond(""), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_substring_stage_is_case_insensitive() {
        let e = engine(INTENTS);
        let m = e.find_intent("Well HELLO friend").unwrap();
        assert_eq!(m.intent.name, "greeting");
        assert_eq!(m.stage, MatchStage::Substring);
    }

    #[test]
    fn test_substring_takes_first_intent_in_file_order() {
        let e = engine(INTENTS);
        let m = e.find_intent("hello, track my order please").unwrap();
        assert_eq!(m.intent.name, "greeting");
    }

    #[test]
    fn test_regex_stage() {
        let e = engine(INTENTS);
        let m = e.find_intent("status of ORDER #4521?").unwrap();
        assert_eq!(m.intent.name, "order_status");
        assert_eq!(m.stage, MatchStage::Regex);

        let m = e.find_intent("are you open on sunday").unwrap();
        assert_eq!(m.intent.name, "hours");
        assert_eq!(m.stage, MatchStage::Regex);
    }

    #[test]
    fn test_fuzzy_stage_tolerates_typos() {
        let e = engine(INTENTS);
        let m = e.find_intent("trak my ordr").unwrap();
        assert_eq!(m.intent.name, "order_status");
        assert_eq!(m.stage, MatchStage::Fuzzy);
        assert!(m.score >= 70.0);
    }

    #[test]
    fn test_tfidf_stage_when_fuzzy_is_below_threshold() {
        let json = r#"[{"intent": "refund", "patterns": ["refund policy details"], "response": "30 days."}]"#;
        let intents = parse_intents(json, &PathBuf::from("t.json")).unwrap();
        let config = MatchConfig {
            fuzzy_threshold: 101.0,
            tfidf_threshold: 0.35,
        };
        let e = IntentEngine::new(intents, config);
        let m = e.find_intent("explain the refund policy to me").unwrap();
        assert_eq!(m.stage, MatchStage::Tfidf);
        assert_eq!(m.intent.name, "refund");
        assert!(m.score >= 0.35);
    }

    #[test]
    fn test_unrelated_message_falls_back() {
        let e = engine(INTENTS);
        assert!(e.find_intent("quantum chromodynamics lecture").is_none());
        assert_eq!(e.respond("quantum chromodynamics lecture"), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_empty_intents_file() {
        let e = engine("[]");
        assert_eq!(e.pattern_count(), 0);
        assert!(e.find_intent("hello").is_none());
    }
}
