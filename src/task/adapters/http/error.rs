//! Mapping of coordinator failures onto HTTP responses.

use crate::task::services::TaskCoordinatorError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error returned by HTTP handlers.
///
/// Rendered as `{"code": "...", "message": "..."}` with the matching status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request was invalid; nothing was written.
    #[error("{0}")]
    Validation(String),
    /// The addressed task does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The task changed since the caller's version.
    #[error("{0}")]
    Conflict(String),
    /// Backend failure. Details are logged, not returned.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl From<TaskCoordinatorError> for ApiError {
    fn from(err: TaskCoordinatorError) -> Self {
        match err {
            TaskCoordinatorError::Domain(domain) => Self::Validation(domain.to_string()),
            TaskCoordinatorError::NotFound(key) => Self::NotFound(format!("task not found: {key}")),
            conflict @ TaskCoordinatorError::ConcurrencyConflict(_) => {
                Self::Conflict(conflict.to_string())
            }
            TaskCoordinatorError::Store(store) => {
                tracing::error!(error = %store, "task store failure");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), axum::Json(body)).into_response()
    }
}
