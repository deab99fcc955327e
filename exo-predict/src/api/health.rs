//! Health and pipeline status endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::service::PipelineStatus;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when every pipeline is available, otherwise "degraded"
    pub status: String,
    /// Module name ("exo-predict")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Number of pipelines able to serve requests
    pub pipelines_available: usize,
}

/// Pipeline status response
#[derive(Debug, Serialize)]
pub struct PipelinesResponse {
    pub pipelines: Vec<PipelineStatus>,
}

/// GET /health
///
/// Always 200 while the process is up; a missing artifact shows as "degraded".
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let statuses = state.service.status();
    let pipelines_available = statuses.iter().filter(|s| s.available).count();
    let status = if pipelines_available == statuses.len() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "exo-predict".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        pipelines_available,
    })
}

/// GET /pipelines
pub async fn pipeline_status(State(state): State<AppState>) -> Json<PipelinesResponse> {
    Json(PipelinesResponse {
        pipelines: state.service.status(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/pipelines", get(pipeline_status))
}
