//! Configuration for IntentBot
//!
//! All configuration is read from environment variables (plus `.env`) or CLI
//! arguments; CLI values win. No global configuration file is used.

pub use intentbot_core::config::{
    parse_package_list, BootstrapConfig, MatchConfig, ObservabilityConfig, ServerConfig,
};
