use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use thiserror::Error;

use super::types::ErrorDetail;
use crate::errors::PolicyQaError;

pub const INVALID_API_KEY: &str = "Invalid API key";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Errors as the client sees them.
///
/// Only two outcomes are visible: bad credentials or a generic failure. The
/// cause of a failure stays in the server log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("Internal server error")]
    InternalError,
}

impl From<PolicyQaError> for ApiError {
    fn from(err: PolicyQaError) -> Self {
        if err.is_auth() {
            tracing::warn!(kind = err.kind(), "Rejected request: {}", err);
            Self::Unauthorized
        } else {
            tracing::error!(kind = err.kind(), "Error processing request: {}", err);
            Self::InternalError
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, INVALID_API_KEY),
            Self::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR),
        };

        (
            status,
            Json(ErrorDetail {
                detail: detail.to_string(),
            }),
        )
            .into_response()
    }
}
