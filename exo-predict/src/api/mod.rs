//! HTTP API handlers for exo-predict
//!
//! Thin adapter over [`PredictionService`](crate::service::PredictionService):
//! deserialize, call the service, serialize. No pipeline logic lives here.

pub mod health;
pub mod predict;

pub use health::health_routes;
pub use predict::predict_routes;
