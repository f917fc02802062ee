//! Chat HTTP service (axum).
//!
//! Routes:
//! - `POST /chat`   `{"message": "..."}` → `{"response": "..."}`
//! - `POST /reload` re-read the intents file
//! - `GET /health`  readiness probe target
//! - `GET /`, `GET /static/*` the bundled chat page

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use intentbot_core::IntentEngine;

use crate::config::{MatchConfig, ServerConfig};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<IntentEngine>>,
    intents_path: PathBuf,
    matching: MatchConfig,
}

impl AppState {
    pub fn new(engine: IntentEngine, intents_path: PathBuf, matching: MatchConfig) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            intents_path,
            matching,
        }
    }

    /// Load the intents file; an unreadable file yields an empty engine so the
    /// service still answers with the fallback until `/reload` succeeds.
    pub fn load(intents_path: PathBuf, matching: MatchConfig) -> Self {
        let engine = match IntentEngine::load(&intents_path, matching) {
            Ok(engine) => {
                tracing::info!(
                    path = %intents_path.display(),
                    intents = engine.intents().len(),
                    patterns = engine.pattern_count(),
                    "Loaded intents"
                );
                engine
            }
            Err(e) => {
                tracing::warn!(error = %e, "Starting without intents; every message gets the fallback");
                IntentEngine::new(Vec::new(), matching)
            }
        };
        Self::new(engine, intents_path, matching)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Json<serde_json::Value> {
    let message = serde_json::from_slice::<ChatRequest>(&body)
        .map(|req| req.message)
        .unwrap_or_default();
    let response = match state.engine.read() {
        Ok(engine) => engine.respond(&message),
        Err(poisoned) => poisoned.into_inner().respond(&message),
    };
    Json(json!({ "response": response }))
}

async fn reload(State(state): State<AppState>) -> Response {
    let path = state.intents_path.clone();
    let matching = state.matching;
    let loaded = tokio::task::spawn_blocking(move || IntentEngine::load(&path, matching)).await;
    match loaded {
        Ok(Ok(engine)) => {
            let count = engine.intents().len();
            match state.engine.write() {
                Ok(mut guard) => *guard = engine,
                Err(poisoned) => *poisoned.into_inner() = engine,
            }
            tracing::info!(intents = count, "Reloaded intents");
            Json(json!({ "ok": true })).into_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Reload failed; keeping previous intents");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let intents = match state.engine.read() {
        Ok(engine) => engine.intents().len(),
        Err(poisoned) => poisoned.into_inner().intents().len(),
    };
    Json(json!({ "status": "ok", "intents": intents }))
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/reload", post(reload))
        .route("/health", get(health))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Bind and serve until Ctrl+C.
pub async fn serve(cfg: ServerConfig) -> Result<()> {
    let state = AppState::load(cfg.intents_path.clone(), cfg.matching);
    let app = router(state, &cfg.static_dir);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, static_dir = %cfg.static_dir.display(), "Chat service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Chat service failed")?;
    Ok(())
}
