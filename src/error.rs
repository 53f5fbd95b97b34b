use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::repo::{ConflictField, StoreError};

/// Classified request failure. Handlers and services return this; the
/// `IntoResponse` impl below is the only place HTTP statuses and client
/// bodies are produced, so internals never leak past it.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Locally generated, never reaches the store.
    #[error("{0}")]
    Validation(String),
    /// A uniqueness invariant was violated, either caught by the
    /// pre-check or translated from the store's duplicate-key signal.
    #[error("duplicate {0}")]
    Conflict(ConflictField),
    /// Deliberately generic so login failures don't reveal whether the
    /// email or the password was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Missing or expired bearer token.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// A token was presented but does not verify.
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("user not found")]
    UserNotFound,
    #[error("analysis service not configured")]
    AnalyzerUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => ApiError::Conflict(field),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(ConflictField::Email) => (
                StatusCode::CONFLICT,
                "User with this email already exists".into(),
            ),
            ApiError::Conflict(ConflictField::Name) => {
                (StatusCode::CONFLICT, "Username is already taken".into())
            }
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".into(),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.into()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.into()),
            ApiError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".into()),
            ApiError::AnalyzerUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Analysis service not configured".into(),
            ),
            ApiError::Internal(cause) => {
                error!(error = %cause, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };
        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}
