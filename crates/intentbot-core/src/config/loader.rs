//! Shared environment-variable loading.
//!
//! Keeps the primary → alias → default fallback chain in one place so config
//! structs never call `std::env::var` directly.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory (never overrides variables already set).
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        load_dotenv_from_dir(&dir);
    });
}

/// Load `<dir>/.env` into the process environment, skipping keys already set.
pub fn load_dotenv_from_dir(dir: &Path) {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            set_env_var(&key, &value);
        }
    }
}

/// Parse `.env` content into key/value pairs.
///
/// Handles blank lines, `#` comments, inline comments outside quotes and
/// single/double quoted values.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read the primary variable or the first set alias; fall back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Read the primary variable or the first set alias (empty counts as unset).
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean variable: 0/false/no/off are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    match env_optional(primary, aliases) {
        Some(s) => !matches!(s.to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        None => default,
    }
}

/// Parse a variable into `T`, falling back to `default` when unset or invalid.
pub fn env_parse<T: std::str::FromStr>(primary: &str, aliases: &[&str], default: T) -> T {
    match env_optional(primary, aliases) {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key = primary, value = %raw, "Ignoring unparsable value, using default");
            default
        }),
        None => default,
    }
}

// All `set_var` / `remove_var` calls go through these wrappers.
// SAFETY contract: call before any threads (tokio runtime included) are started.

#[allow(unsafe_code)]
pub fn set_env_var(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}

#[allow(unsafe_code)]
pub fn remove_env_var(key: &str) {
    unsafe { env::remove_var(key) };
}
