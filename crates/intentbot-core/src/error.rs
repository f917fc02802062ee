use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading an intents file.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Failed to read intents file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid intents JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Intents file {0} must be a list or an object with an \"intents\" list")]
    Shape(PathBuf),
}
