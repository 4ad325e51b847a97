//! The error type returned by every HTTP handler.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Each variant maps to one HTTP status. The body is always `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// The referenced student does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// A unique column would be duplicated. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// The database failed. HTTP 500.
    #[error("storage error: {0}")]
    Storage(DieselError),

    /// The shared connection was poisoned by a panicking request. HTTP 500.
    #[error("storage connection unavailable")]
    Unavailable,

    /// The blocking task running the database work panicked or was cancelled. HTTP 500.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn student_not_found() -> Self {
        AppError::NotFound("Student not found".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Unavailable | AppError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(info.message().to_string())
            }
            other => AppError::Storage(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::student_not_found().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(DieselError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(DieselError::RollbackTransaction),
            AppError::Storage(_)
        ));
    }
}
