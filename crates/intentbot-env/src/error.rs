use std::path::PathBuf;

use thiserror::Error;

/// Failures of individual bootstrap steps.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("No Python interpreter found on PATH (tried {tried})")]
    InterpreterNotFound { tried: String },

    #[error("Failed to create environment at {path}: {reason}")]
    EnvCreate { path: PathBuf, reason: String },

    #[error("`{command}` failed: {reason}")]
    Install { command: String, reason: String },

    #[error("Failed to launch `{command}`: {reason}")]
    Launch { command: String, reason: String },

    #[error("Application not ready at {target} after {attempts} attempts")]
    NotReady { target: String, attempts: u32 },

    #[error("Application exited before becoming ready ({status})")]
    AppExited { status: String },

    #[error("Failed to open browser at {url}: {reason}")]
    Browser { url: String, reason: String },

    #[error("Unexpected `pip list` output: {0}")]
    PipList(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
