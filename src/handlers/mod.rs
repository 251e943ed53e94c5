pub mod webhook;

pub use webhook::handle_webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

/// Webhook bodies are a handful of fields; anything larger is not ours
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: "payguard",
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(handle_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
