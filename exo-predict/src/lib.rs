//! exo-predict library interface
//!
//! Exoplanet characterization inference: artifact registry, feature
//! derivation, staged and fused pipelines, output mapping, and the HTTP
//! adapter that exposes them.

pub mod api;
pub mod artifacts;
pub mod error;
pub mod features;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::service::PredictionService;
pub use crate::types::{PipelineError, PipelineKind};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only prediction pipelines
    pub service: Arc<PredictionService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
