//! IntentBot configuration layer
//!
//! All environment reads live here; callers use typed config structs instead
//! of `std::env::var`.
//!
//! - `loader`: env_or, env_optional, env_bool, `.env` loading
//! - `schema`: BootstrapConfig, ServerConfig, MatchConfig, ObservabilityConfig
//! - `env_keys`: key constants and aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{
    env_bool, env_optional, env_or, env_parse, load_dotenv, load_dotenv_from_dir,
    remove_env_var, set_env_var,
};
pub use schema::{
    parse_package_list, BootstrapConfig, MatchConfig, ObservabilityConfig, ServerConfig,
};
