//! Error types for exo-predict's HTTP adapter
//!
//! Maps the pipeline failure taxonomy onto HTTP status codes:
//! - `InvalidInput` → 400
//! - `ShapeMismatch` → 422
//! - `ArtifactUnavailable` → 503
//! - `Unexpected` → 500

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::PipelineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be read as the expected JSON (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Pipeline failure
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Pipeline(ref err) => {
                let (status, code) = match err {
                    PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                    PipelineError::ShapeMismatch { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "SHAPE_MISMATCH")
                    }
                    PipelineError::ArtifactUnavailable { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "ARTIFACT_UNAVAILABLE")
                    }
                    PipelineError::Unexpected(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "UNEXPECTED_ERROR")
                    }
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PipelineKind, Shape};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PipelineError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                PipelineError::ShapeMismatch {
                    stage: "scale".into(),
                    expected: Shape::vector(3),
                    actual: Shape::vector(2),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PipelineError::ArtifactUnavailable {
                    pipeline: PipelineKind::Gas,
                    reason: "missing".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (PipelineError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
