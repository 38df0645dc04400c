//! HTTP error boundary.
//!
//! Validation failures carry their message to the client; everything else
//! is logged with full detail and answered with an opaque 500 so provider
//! and credential internals never leak into responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use meetsched_google::{ProviderError, ProviderErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Calendar provider error: {0}")]
    Provider(ProviderError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            ProviderErrorCode::AuthenticationFailed | ProviderErrorCode::AuthorizationFailed => {
                ApiError::Authentication(err.to_string())
            }
            _ => ApiError::Provider(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            ApiError::Authentication(detail) => {
                tracing::error!("authentication failure: {}", detail);
                opaque_internal()
            }
            ApiError::Provider(err) => {
                tracing::error!("calendar provider failure: {}", err);
                opaque_internal()
            }
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                opaque_internal()
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

fn opaque_internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "internal server error".to_string(),
    )
}
