//! Where fired reminders go.
//!
//! No push backend is wired in: the default sink logs the event. Embedders and tests can
//! receive notifications on a channel instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub task_id: String,
    pub message: String,
    pub fired_at: DateTime<Utc>,
}

/// Side effect run exactly once per fired job. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::info!(
            task_id = %notification.task_id,
            fired_at = %notification.fired_at,
            "notification sent: {}",
            notification.message
        );
    }
}

/// Forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: &Notification) {
        if self.tx.send(notification.clone()).is_err() {
            tracing::warn!(task_id = %notification.task_id, "notification receiver dropped");
        }
    }
}
