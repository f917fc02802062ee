//! Environment variable keys and aliases.
//!
//! Primary names use the `INTENTBOT_*` prefix; aliases cover the short names
//! the setup script era relied on.

/// Bootstrap: environment, packages, launch target, browser URL
pub mod bootstrap {
    pub const INTENTBOT_ENV_DIR: &str = "INTENTBOT_ENV_DIR";
    pub const ENV_DIR_ALIASES: &[&str] = &["VENV_DIR"];

    /// Interpreter used to create the environment (python3 / python / py)
    pub const INTENTBOT_PYTHON: &str = "INTENTBOT_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["PYTHON"];

    /// Whitespace-separated package list
    pub const INTENTBOT_PACKAGES: &str = "INTENTBOT_PACKAGES";

    pub const INTENTBOT_ENTRY_POINT: &str = "INTENTBOT_ENTRY_POINT";

    pub const INTENTBOT_URL: &str = "INTENTBOT_URL";

    /// Fixed readiness delay in seconds
    pub const INTENTBOT_READY_DELAY_SECS: &str = "INTENTBOT_READY_DELAY_SECS";

    /// Health path for the HTTP readiness probe (e.g. "/health"). Unset → TCP probe.
    pub const INTENTBOT_HEALTH_PATH: &str = "INTENTBOT_HEALTH_PATH";

    /// Abort on the first failed step instead of continuing
    pub const INTENTBOT_STRICT: &str = "INTENTBOT_STRICT";
}

/// Chat service
pub mod server {
    pub const INTENTBOT_HOST: &str = "INTENTBOT_HOST";
    pub const INTENTBOT_PORT: &str = "INTENTBOT_PORT";
    pub const PORT_ALIASES: &[&str] = &["PORT"];

    pub const INTENTBOT_INTENTS: &str = "INTENTBOT_INTENTS";
    pub const INTENTS_ALIASES: &[&str] = &["INTENTS_PATH"];

    pub const INTENTBOT_STATIC_DIR: &str = "INTENTBOT_STATIC_DIR";

    pub const INTENTBOT_FUZZY_THRESHOLD: &str = "INTENTBOT_FUZZY_THRESHOLD";
    pub const INTENTBOT_TFIDF_THRESHOLD: &str = "INTENTBOT_TFIDF_THRESHOLD";
}

/// Observability and logging
pub mod observability {
    pub const INTENTBOT_QUIET: &str = "INTENTBOT_QUIET";
    pub const INTENTBOT_LOG_LEVEL: &str = "INTENTBOT_LOG_LEVEL";
    pub const INTENTBOT_LOG_JSON: &str = "INTENTBOT_LOG_JSON";
    pub const INTENTBOT_AUDIT_LOG: &str = "INTENTBOT_AUDIT_LOG";
}
