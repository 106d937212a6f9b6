//! HTTP surface of the reminder service.
//!
//! ## Endpoints
//!
//! - `POST /api/schedule`: `{taskId, message, time}`; 201 scheduled, 200 past, 400 bad input, 500 timer failure
//! - `POST /api/cancel`: `{taskId}`; 200 whether or not a job existed
//! - `GET /`: plain-text liveness with the pending job count
//! - `GET /health`: JSON status and counters

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::scheduler::{CancelOutcome, ReminderScheduler, ScheduleOutcome};

pub const MSG_SCHEDULED: &str = "Notification scheduled successfully";
pub const MSG_SKIPPED_PAST: &str = "Notification time is in the past, not scheduled.";
pub const MSG_CANCELLED: &str = "Notification cancelled successfully";
pub const MSG_NOT_FOUND: &str = "No active notification found to cancel";

/// Body of `POST /api/schedule`. Fields are optional so a missing one is a 400, not a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// ISO-8601 fire time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub pending_jobs: usize,
    pub fired_total: u64,
    pub cancelled_total: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub scheduler: ReminderScheduler,
}

impl AppState {
    pub fn new(scheduler: ReminderScheduler) -> Self {
        Self { scheduler }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/api/schedule", post(schedule_reminder))
        .route("/api/cancel", post(cancel_reminder))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The browser client calls from another origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Treat absent and blank strings alike.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

async fn schedule_reminder(
    State(state): State<AppState>,
    body: Result<Json<ScheduleBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageBody>)> {
    let Json(body) = body.map_err(|e| {
        debug!(error = %e, "rejected schedule body");
        ApiError::BadRequest("Missing required fields".into())
    })?;

    let (Some(task_id), Some(message), Some(time)) =
        (present(body.task_id), present(body.message), present(body.time))
    else {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    };

    match state.scheduler.schedule_at_str(&task_id, &message, &time)? {
        ScheduleOutcome::Scheduled { .. } => {
            Ok((StatusCode::CREATED, MessageBody::new(MSG_SCHEDULED)))
        }
        ScheduleOutcome::SkippedPast => Ok((StatusCode::OK, MessageBody::new(MSG_SKIPPED_PAST))),
    }
}

async fn cancel_reminder(
    State(state): State<AppState>,
    body: Result<Json<CancelBody>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let task_id = body
        .ok()
        .and_then(|Json(b)| present(b.task_id))
        .ok_or_else(|| ApiError::BadRequest("Missing taskId".into()))?;

    Ok(match state.scheduler.cancel(&task_id) {
        CancelOutcome::Cancelled => MessageBody::new(MSG_CANCELLED),
        CancelOutcome::NotFound => MessageBody::new(MSG_NOT_FOUND),
    })
}

async fn liveness(State(state): State<AppState>) -> String {
    format!(
        "UniFlow Notification Server is running. Active jobs: {}",
        state.scheduler.pending_count()
    )
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let stats = state.scheduler.stats();
    Json(HealthBody {
        status: "ok".to_string(),
        pending_jobs: stats.pending,
        fired_total: stats.fired,
        cancelled_total: stats.cancelled,
    })
}
