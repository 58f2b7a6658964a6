use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Error taxonomy for coordinator operations.
///
/// Capacity conflicts are never represented here: a full shift makes RSVP
/// fall back to the waitlist instead of failing. Token failures are
/// deliberately undifferentiated (unknown, expired and already-used all map
/// to `TokenInvalid`) so callers cannot probe for token existence.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("shift not found")]
    ShiftNotFound,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid check-in token")]
    TokenInvalid,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            CoordinatorError::ShiftNotFound => (StatusCode::NOT_FOUND, "shift_not_found"),
            CoordinatorError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            CoordinatorError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            CoordinatorError::TokenInvalid => (StatusCode::NOT_FOUND, "invalid_token"),
            CoordinatorError::Database(e) => {
                warn!("Database failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        (status, Json(json!({ "error": code }))).into_response()
    }
}
