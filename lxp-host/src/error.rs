//! Error types for lxp-host
//!
//! Every handler error becomes a JSON body `{"error": "..."}`. Failures that
//! wrap a lower-level cause add `"details"` with that cause's description.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Package ingestion failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// lxp-common error
    #[error(transparent)]
    Common(#[from] lxp_common::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Common(lxp_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Ingest(err) => match err.details() {
                Some(details) => json!({ "error": err.to_string(), "details": details }),
                None => json!({ "error": err.to_string() }),
            },
            ApiError::Common(lxp_common::Error::InvalidInput(msg)) => json!({ "error": msg }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
