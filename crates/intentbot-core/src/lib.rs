pub mod config;
pub mod error;
pub mod fuzzy;
pub mod intents;
pub mod matcher;
pub mod tfidf;

pub use error::IntentError;
pub use intents::{load_intents, parse_intents, Intent};
pub use matcher::{IntentEngine, MatchOutcome, MatchStage, FALLBACK_RESPONSE};
