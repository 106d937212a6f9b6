//! Reminder service for UniFlow.
//!
//! An in-memory registry of one-shot timers keyed by task id, exposed over HTTP, plus the
//! client the application layer uses to keep reminders in step with task edits.

pub mod api;
pub mod client;
pub mod error;
pub mod notifier;
pub mod scheduler;
pub mod server;

pub use api::{router, AppState};
pub use client::{CancelReply, ClientError, ReminderClient, ScheduleReply};
pub use error::{ApiError, ScheduleError};
pub use notifier::{ChannelNotifier, LogNotifier, Notification, Notifier};
pub use scheduler::{CancelOutcome, ReminderScheduler, ScheduleOutcome, SchedulerStats};
pub use server::{serve, ReminderServer};
