//! Reminder policy: what the application layer asks the reminder service to do after a
//! task mutation.
//!
//! The service only ever sees absolute fire times. The lead time before the deadline is
//! decided here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Longest lead time a configuration may ask for: one (leap) year.
pub const MAX_LEAD_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Minutes before the deadline at which the reminder fires.
    pub lead_minutes: i64,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self { lead_minutes: 15 }
    }
}

impl ReminderPolicy {
    /// `None` when the lead is out of range for chrono or pushes the instant off the calendar.
    pub fn fire_time(&self, task: &Task) -> Option<DateTime<Utc>> {
        Duration::try_minutes(self.lead_minutes)
            .and_then(|lead| task.due_date.checked_sub_signed(lead))
    }
}

/// Body of a schedule call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub task_id: String,
    pub message: String,
    pub fire_at: DateTime<Utc>,
}

/// One reminder side effect for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderPlan {
    Schedule(ReminderRequest),
    Cancel { task_id: String },
}

impl ReminderPlan {
    pub fn task_id(&self) -> &str {
        match self {
            ReminderPlan::Schedule(req) => &req.task_id,
            ReminderPlan::Cancel { task_id } => task_id,
        }
    }
}

pub fn reminder_message(task: &Task, policy: ReminderPolicy) -> String {
    format!(
        "Reminder: \"{}\" is due in {} minutes!",
        task.title, policy.lead_minutes
    )
}

/// Plan the reminder for a task that was just created or edited.
///
/// Completed tasks and tasks whose fire time has already passed get a cancel, so a job left
/// over from an earlier due date cannot fire for the new one. A fire time that cannot be
/// computed cancels too.
pub fn plan_for_upsert(task: &Task, now: DateTime<Utc>, policy: ReminderPolicy) -> ReminderPlan {
    if task.is_completed {
        return ReminderPlan::Cancel {
            task_id: task.id.clone(),
        };
    }

    let Some(fire_at) = policy.fire_time(task).filter(|at| *at > now) else {
        return ReminderPlan::Cancel {
            task_id: task.id.clone(),
        };
    };

    ReminderPlan::Schedule(ReminderRequest {
        task_id: task.id.clone(),
        message: reminder_message(task, policy),
        fire_at,
    })
}

pub fn plan_for_delete(task_id: &str) -> ReminderPlan {
    ReminderPlan::Cancel {
        task_id: task_id.to_string(),
    }
}
