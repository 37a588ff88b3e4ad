//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use vidgen_genai::GenError;
use vidgen_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        if e.is_client_error() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Internal(e.to_string())
        }
    }
}

impl From<GenError> for ApiError {
    fn from(e: GenError) -> Self {
        Self::from(PipelineError::Generation(e))
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(format!("Invalid multipart body: {e}"))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal detail goes to the logs, never to the caller
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgen_media::MediaError;
    use vidgen_models::ValidationError;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let pipeline_err: PipelineError =
            ValidationError::new("clipLength", "must be at least 0.1").into();
        let api_err = ApiError::from(pipeline_err);
        assert!(matches!(api_err, ApiError::BadRequest(_)));
        assert!(api_err.to_string().contains("clipLength"));
    }

    #[test]
    fn test_stage_failure_maps_to_internal() {
        let pipeline_err: PipelineError = MediaError::Timeout(120).into();
        assert!(matches!(ApiError::from(pipeline_err), ApiError::Internal(_)));
    }
}
