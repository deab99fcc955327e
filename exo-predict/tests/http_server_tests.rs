//! HTTP Server & Routing Integration Tests

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use exo_common::config::BranchSchedule;
use exo_predict::registry::ids;
use exo_predict::{build_router, AppState, PredictionService};
use helpers::{reference_registry, reference_service, GAS_FEATURE_WIDTH, SPECTRUM_LENGTH};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> axum::Router {
    build_router(AppState::new(reference_service(BranchSchedule::Concurrent)))
}

async fn post(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn gas_body(spectrum_len: usize) -> Value {
    json!({
        "spectrum": vec![0.005; spectrum_len],
        "planetary_features": vec![1.0; GAS_FEATURE_WIDTH],
    })
}

#[tokio::test]
async fn test_planet_type_route() {
    let (status, body) = post(app(), "/predict-planet-type", json!({ "mass": 1.0, "radius": 1.0 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Terran");
    assert_eq!(body["pl_mass"], 1.0);
    assert_eq!(body["pl_radius"], 1.0);
}

#[tokio::test]
async fn test_invalid_input_is_400() {
    let (status, body) = post(app(), "/predict-planet-type", json!({ "pl_mass": 0.0, "pl_radius": 1.0 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (status, body) = post(app(), "/predict-planet-type", json!({ "pl_mass": "heavy" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_radiation_route() {
    let (status, body) = post(
        app(),
        "/predict-radiation",
        json!({
            "stellar_temp": 5778.0,
            "stellar_metal": 0.0,
            "stellar_log_lum": 0.0,
            "stellar_age": 4.6,
            "stellar_dist": 10.0,
            "pl_mass": 5.0,
            "pl_radius": 2.0,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "High");
}

#[tokio::test]
async fn test_gas_route_wraps_composition() {
    let (status, body) = post(app(), "/predict-gas", gas_body(SPECTRUM_LENGTH)).await;

    assert_eq!(status, StatusCode::OK);
    let gases = body["predicted_gases"].as_object().unwrap();
    assert_eq!(gases.len(), 12);
    for key in ["H2O", "CO2", "O2", "N2", "CH4", "N2O", "CO", "O3", "SO2", "NH3", "C2H6", "NO2"] {
        assert!(gases[key].is_f64(), "missing {}", key);
    }
}

#[tokio::test]
async fn test_short_spectrum_is_422() {
    let (status, body) = post(app(), "/predict-gas", gas_body(SPECTRUM_LENGTH - 10)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "SHAPE_MISMATCH");
    assert!(body["error"]["message"].as_str().unwrap().contains("spectral_encode"));
}

#[tokio::test]
async fn test_habitability_route_with_missing_fields() {
    let (status, body) = post(
        app(),
        "/predict-habitability",
        json!({ "P_TEMP_SURF": 288.0, "P_RADIUS": null }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let scores = body.as_object().unwrap();
    assert_eq!(scores.len(), 4);
    assert!(scores["P_ESI"].is_f64());
}

#[tokio::test]
async fn test_unavailable_pipeline_is_503_others_200() {
    let service = PredictionService::new(
        &reference_registry(&[ids::GAS_FUSION]),
        BranchSchedule::Concurrent,
    );
    let app = build_router(AppState::new(service));

    let (status, body) = post(app.clone(), "/predict-gas", gas_body(SPECTRUM_LENGTH)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "ARTIFACT_UNAVAILABLE");

    let (status, _) = post(app.clone(), "/predict-planet-type", json!({ "mass": 1.0, "radius": 1.0 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, health) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["pipelines_available"], 3);

    let (status, pipelines) = get(app, "/pipelines").await;
    assert_eq!(status, StatusCode::OK);
    let gas = pipelines["pipelines"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["pipeline"] == "gas")
        .unwrap();
    assert_eq!(gas["available"], false);
    assert!(gas["reason"].as_str().unwrap().contains("gas/fusion"));
}

#[tokio::test]
async fn test_health_ok_when_all_pipelines_ready() {
    let (status, body) = get(app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "exo-predict");
    assert_eq!(body["pipelines_available"], 4);
}
