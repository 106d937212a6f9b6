//! Error types for the reminder service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Why a schedule request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A required field was absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The fire time does not parse to a real instant.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// The timer could not be armed (no runtime, or an unrepresentable delay).
    #[error("failed to arm reminder timer: {0}")]
    TimerUnavailable(String),
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// HTTP-facing error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::MissingField(_) => ApiError::BadRequest("Missing required fields".into()),
            ScheduleError::InvalidTime(_) => ApiError::BadRequest("Invalid time format".into()),
            ScheduleError::TimerUnavailable(msg) => {
                tracing::error!(error = %msg, "failed to schedule job");
                ApiError::Internal("Failed to schedule job.".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
