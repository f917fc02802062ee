//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{bootstrap as boot_keys, observability as obv_keys, server as srv_keys};
use super::loader::{env_bool, env_optional, env_or, env_parse};
use std::path::PathBuf;

/// Packages the launched app imports: flask, flask_cors, rapidfuzz, sklearn.
pub const DEFAULT_PACKAGES: &[&str] = &["flask", "flask-cors", "rapidfuzz", "scikit-learn"];

pub const DEFAULT_ENV_DIR: &str = "venv";
pub const DEFAULT_ENTRY_POINT: &str = "app.py";
pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_READY_DELAY_SECS: u64 = 3;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_INTENTS_PATH: &str = "intents.json";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 70.0;
pub const DEFAULT_TFIDF_THRESHOLD: f64 = 0.35;

/// Bootstrap sequence configuration (`intentbot up`).
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub env_dir: PathBuf,
    /// Interpreter used for `-m venv`; `None` → discover on PATH
    pub python: Option<String>,
    pub packages: Vec<String>,
    pub entry_point: String,
    pub url: String,
    pub ready_delay_secs: u64,
    /// HTTP health path for the readiness probe; `None` → plain TCP connect
    pub health_path: Option<String>,
    pub strict: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            env_dir: PathBuf::from(DEFAULT_ENV_DIR),
            python: None,
            packages: DEFAULT_PACKAGES.iter().map(|s| s.to_string()).collect(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            url: DEFAULT_URL.to_string(),
            ready_delay_secs: DEFAULT_READY_DELAY_SECS,
            health_path: None,
            strict: false,
        }
    }
}

impl BootstrapConfig {
    /// Load from environment (reads `.env` first), empty values use defaults.
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let defaults = Self::default();
        Self {
            env_dir: env_optional(boot_keys::INTENTBOT_ENV_DIR, boot_keys::ENV_DIR_ALIASES)
                .map(PathBuf::from)
                .unwrap_or(defaults.env_dir),
            python: env_optional(boot_keys::INTENTBOT_PYTHON, boot_keys::PYTHON_ALIASES),
            packages: env_optional(boot_keys::INTENTBOT_PACKAGES, &[])
                .map(|s| parse_package_list(&s))
                .unwrap_or(defaults.packages),
            entry_point: env_or(boot_keys::INTENTBOT_ENTRY_POINT, &[], || defaults.entry_point),
            url: env_or(boot_keys::INTENTBOT_URL, &[], || defaults.url),
            ready_delay_secs: env_parse(
                boot_keys::INTENTBOT_READY_DELAY_SECS,
                &[],
                DEFAULT_READY_DELAY_SECS,
            ),
            health_path: env_optional(boot_keys::INTENTBOT_HEALTH_PATH, &[]),
            strict: env_bool(boot_keys::INTENTBOT_STRICT, &[], false),
        }
    }
}

/// Split a whitespace-separated package list, the way the install line reads it.
pub fn parse_package_list(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(String::from).collect()
}

/// Intent matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// token_set_ratio score in 0..=100
    pub fuzzy_threshold: f64,
    /// cosine similarity in 0..=1
    pub tfidf_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            tfidf_threshold: DEFAULT_TFIDF_THRESHOLD,
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            fuzzy_threshold: env_parse(
                srv_keys::INTENTBOT_FUZZY_THRESHOLD,
                &[],
                DEFAULT_FUZZY_THRESHOLD,
            ),
            tfidf_threshold: env_parse(
                srv_keys::INTENTBOT_TFIDF_THRESHOLD,
                &[],
                DEFAULT_TFIDF_THRESHOLD,
            ),
        }
    }
}

/// Chat service configuration (`intentbot serve`).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub intents_path: PathBuf,
    pub static_dir: PathBuf,
    pub matching: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            intents_path: PathBuf::from(DEFAULT_INTENTS_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            matching: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            host: env_or(srv_keys::INTENTBOT_HOST, &[], || DEFAULT_HOST.to_string()),
            port: env_parse(srv_keys::INTENTBOT_PORT, srv_keys::PORT_ALIASES, DEFAULT_PORT),
            intents_path: PathBuf::from(env_or(
                srv_keys::INTENTBOT_INTENTS,
                srv_keys::INTENTS_ALIASES,
                || DEFAULT_INTENTS_PATH.to_string(),
            )),
            static_dir: PathBuf::from(env_or(srv_keys::INTENTBOT_STATIC_DIR, &[], || {
                DEFAULT_STATIC_DIR.to_string()
            })),
            matching: MatchConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Observability: quiet, log_level, log_json, audit_log
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::INTENTBOT_QUIET, &[], false),
                log_level: env_or(obv_keys::INTENTBOT_LOG_LEVEL, &[], || {
                    "intentbot=info,intentbot_env=info,intentbot_core=info".to_string()
                }),
                log_json: env_bool(obv_keys::INTENTBOT_LOG_JSON, &[], false),
                audit_log: env_optional(obv_keys::INTENTBOT_AUDIT_LOG, &[]),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_list_whitespace() {
        assert_eq!(
            parse_package_list("  flask\tflask-cors\n rapidfuzz  "),
            vec!["flask", "flask-cors", "rapidfuzz"]
        );
        assert!(parse_package_list("   ").is_empty());
    }

    #[test]
    fn test_bootstrap_defaults() {
        let cfg = BootstrapConfig::default();
        assert_eq!(cfg.env_dir, PathBuf::from("venv"));
        assert_eq!(cfg.packages.len(), 4);
        assert_eq!(cfg.url, "http://127.0.0.1:8000");
        assert_eq!(cfg.ready_delay_secs, 3);
        assert!(!cfg.strict);
    }

    #[test]
    fn test_server_bind_addr() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
    }
}
