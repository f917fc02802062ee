//! CLI commands.
//!
//!   up    — bootstrap sequence (intentbot-env)
//!   serve — chat service (server/)
//!   env   — environment status / clean

pub mod env;
pub mod serve;
pub mod up;
