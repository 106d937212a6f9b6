//! Client for the reminder API, used by the application layer.
//!
//! Reminders are best-effort: [`ReminderClient::apply`] never fails the caller. It logs and
//! moves on when the service is down or rejects the call.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use uniflow_core::reminders::{ReminderPlan, ReminderRequest};
use uniflow_core::time::to_rfc3339_utc;

use crate::api::{CancelBody, HealthBody, MessageBody, ScheduleBody, MSG_CANCELLED};
use crate::error::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("reminder service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reminder service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but the body was not what the API returns.
    #[error("unreadable reply from reminder service: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    /// Worth another attempt: connection trouble or a server-side fault.
    fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleReply {
    Scheduled,
    SkippedPast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReply {
    Cancelled,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct ReminderClient {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl ReminderClient {
    pub fn new(base_url: &str, timeout: Duration, retries: u32) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn schedule(&self, req: &ReminderRequest) -> Result<ScheduleReply, ClientError> {
        let body = ScheduleBody {
            task_id: Some(req.task_id.clone()),
            message: Some(req.message.clone()),
            time: Some(to_rfc3339_utc(req.fire_at)),
        };
        let url = format!("{}/api/schedule", self.base_url);
        let (http, url, body) = (&self.http, &url, &body);

        self.with_retries(|| async move {
            let resp = http.post(url).json(body).send().await?;
            match resp.status() {
                StatusCode::CREATED => Ok(ScheduleReply::Scheduled),
                StatusCode::OK => Ok(ScheduleReply::SkippedPast),
                other => Err(status_error(other, resp).await),
            }
        })
        .await
    }

    pub async fn cancel(&self, task_id: &str) -> Result<CancelReply, ClientError> {
        let body = CancelBody {
            task_id: Some(task_id.to_string()),
        };
        let url = format!("{}/api/cancel", self.base_url);
        let (http, url, body) = (&self.http, &url, &body);

        self.with_retries(|| async move {
            let resp = http.post(url).json(body).send().await?;
            if resp.status() != StatusCode::OK {
                return Err(status_error(resp.status(), resp).await);
            }
            // Both outcomes are 200; only the message tells them apart.
            let msg: MessageBody = resp.json().await.map_err(ClientError::Decode)?;
            Ok(if msg.message == MSG_CANCELLED {
                CancelReply::Cancelled
            } else {
                CancelReply::NotFound
            })
        })
        .await
    }

    pub async fn health(&self) -> Result<HealthBody, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status(), resp).await);
        }
        resp.json().await.map_err(ClientError::Decode)
    }

    /// Carry out a reminder plan. Returns whether the service acknowledged it.
    pub async fn apply(&self, plan: &ReminderPlan) -> bool {
        let result = match plan {
            ReminderPlan::Schedule(req) => self.schedule(req).await.map(|r| {
                debug!(task_id = %req.task_id, reply = ?r, "reminder scheduled");
            }),
            ReminderPlan::Cancel { task_id } => self.cancel(task_id).await.map(|r| {
                debug!(%task_id, reply = ?r, "reminder cancelled");
            }),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(task_id = %plan.task_id(), error = %e, "reminder call failed; continuing");
                false
            }
        }
    }

    async fn with_retries<T, F, Fut>(&self, mut call: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    debug!(attempt, error = %e, "retrying reminder call");
                    tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                }
                other => return other,
            }
        }
    }
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> ClientError {
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    ClientError::Status {
        status: status.as_u16(),
        body,
    }
}
