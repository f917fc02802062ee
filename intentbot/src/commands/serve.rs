//! `intentbot serve` — run the chat service.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::ServerConfig;
use crate::server;

#[derive(Debug, Default, Clone)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub intents: Option<String>,
    pub static_dir: Option<String>,
    pub fuzzy_threshold: Option<f64>,
    pub tfidf_threshold: Option<f64>,
}

pub fn apply_overrides(mut cfg: ServerConfig, opts: &ServeOptions) -> ServerConfig {
    if let Some(ref h) = opts.host {
        cfg.host = h.clone();
    }
    if let Some(p) = opts.port {
        cfg.port = p;
    }
    if let Some(ref i) = opts.intents {
        cfg.intents_path = PathBuf::from(i);
    }
    if let Some(ref s) = opts.static_dir {
        cfg.static_dir = PathBuf::from(s);
    }
    if let Some(t) = opts.fuzzy_threshold {
        cfg.matching.fuzzy_threshold = t;
    }
    if let Some(t) = opts.tfidf_threshold {
        cfg.matching.tfidf_threshold = t;
    }
    cfg
}

pub fn cmd_serve(opts: ServeOptions) -> Result<()> {
    let cfg = apply_overrides(ServerConfig::from_env(), &opts);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    rt.block_on(server::serve(cfg))
}
