//! Liveness and health endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Root liveness payload
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub policy: String,
    pub uptime_secs: u64,
}

/// GET /
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "API is running!".to_string(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "numclass-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        policy: state.enricher.policy().to_string(),
        uptime_secs: state.startup_time.elapsed().as_secs(),
    })
}

/// Build liveness and health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health_check))
}
