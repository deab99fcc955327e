//! Prediction endpoints
//!
//! - `POST /predict-planet-type`
//! - `POST /predict-radiation`
//! - `POST /predict-gas`
//! - `POST /predict-habitability`

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use crate::error::ApiResult;
use crate::features::{GasRequest, HabitabilityRequest, PlanetTypeRequest, RadiationRequest};
use crate::output::{GasPrediction, HabitabilityScores, PlanetTypePrediction, RadiationPrediction};
use crate::AppState;

/// POST /predict-planet-type
pub async fn predict_planet_type(
    State(state): State<AppState>,
    payload: Result<Json<PlanetTypeRequest>, JsonRejection>,
) -> ApiResult<Json<PlanetTypePrediction>> {
    let Json(request) = payload?;
    Ok(Json(state.service.predict_planet_type(&request)?))
}

/// POST /predict-radiation
pub async fn predict_radiation(
    State(state): State<AppState>,
    payload: Result<Json<RadiationRequest>, JsonRejection>,
) -> ApiResult<Json<RadiationPrediction>> {
    let Json(request) = payload?;
    Ok(Json(state.service.predict_radiation(&request)?))
}

/// POST /predict-gas
pub async fn predict_gas(
    State(state): State<AppState>,
    payload: Result<Json<GasRequest>, JsonRejection>,
) -> ApiResult<Json<GasPrediction>> {
    let Json(request) = payload?;
    Ok(Json(state.service.predict_gas(&request).await?))
}

/// POST /predict-habitability
pub async fn predict_habitability(
    State(state): State<AppState>,
    payload: Result<Json<HabitabilityRequest>, JsonRejection>,
) -> ApiResult<Json<HabitabilityScores>> {
    let Json(request) = payload?;
    Ok(Json(state.service.predict_habitability(&request)?))
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/predict-planet-type", post(predict_planet_type))
        .route("/predict-radiation", post(predict_radiation))
        .route("/predict-gas", post(predict_gas))
        .route("/predict-habitability", post(predict_habitability))
}
