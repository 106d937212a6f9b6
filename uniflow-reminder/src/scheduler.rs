//! Reminder scheduler: one pending timer per task id.
//!
//! Per task id the lifecycle is
//!
//! ```text
//! NoJob --schedule(t > now)--> Pending --timer elapses--> (notify) --> NoJob
//!                              Pending --cancel--------------------> NoJob
//!                              Pending --schedule again------------> Pending (old timer aborted)
//! NoJob --schedule(t <= now)--> NoJob  (SkippedPast)
//! NoJob --cancel--------------> NoJob  (NotFound)
//! ```
//!
//! Every registry mutation happens under a single mutex acquisition. A firing timer only
//! notifies if, under that same lock, the registry still holds *its* job id; cancel and
//! replace remove the entry under the lock. So a job fires at most once and never after a
//! cancel or replace has returned.
//!
//! Jobs live in memory only; dropping the scheduler (or a process restart) drops them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uniflow_core::time::{parse_instant, Clock};

use crate::error::ScheduleError;
use crate::notifier::{Notification, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOutcome {
    /// A job is now pending. `replaced` is set when an earlier job for the id was cancelled.
    Scheduled { replaced: bool },
    /// The fire time was not in the future; nothing was registered.
    SkippedPast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled,
    /// No pending job: never scheduled, already fired or already cancelled.
    NotFound,
}

/// Counters for the introspection endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub pending: usize,
    pub fired: u64,
    pub cancelled: u64,
}

struct Job {
    id: u64,
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

struct Inner {
    jobs: Mutex<HashMap<String, Job>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    next_job_id: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
}

impl Inner {
    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, task_id: &str, job_id: u64, message: String) {
        {
            let mut jobs = self.lock_jobs();
            match jobs.get(task_id) {
                Some(job) if job.id == job_id => {
                    jobs.remove(task_id);
                }
                // Cancelled or replaced while we were waking up.
                _ => return,
            }
        }
        self.fired.fetch_add(1, Ordering::Relaxed);

        let notification = Notification {
            task_id: task_id.to_string(),
            message,
            fired_at: self.clock.now(),
        };
        self.notifier.notify(&notification);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let jobs = self.jobs.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, job) in jobs.drain() {
            job.handle.abort();
        }
    }
}

/// Shared handle to the job registry. Clones refer to the same registry.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

impl ReminderScheduler {
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                clock,
                notifier,
                next_job_id: AtomicU64::new(1),
                fired: AtomicU64::new(0),
                cancelled: AtomicU64::new(0),
            }),
        }
    }

    /// Like [`schedule`](Self::schedule), taking the fire time as an ISO-8601 string.
    pub fn schedule_at_str(
        &self,
        task_id: &str,
        message: &str,
        time: &str,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let fire_at =
            parse_instant(time).ok_or_else(|| ScheduleError::InvalidTime(time.to_string()))?;
        self.schedule(task_id, message, fire_at)
    }

    /// Arm a one-shot reminder for `task_id`, replacing any pending one.
    pub fn schedule(
        &self,
        task_id: &str,
        message: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        if task_id.trim().is_empty() {
            return Err(ScheduleError::MissingField("taskId"));
        }
        if message.trim().is_empty() {
            return Err(ScheduleError::MissingField("message"));
        }

        let now = self.inner.clock.now();
        if fire_at <= now {
            info!(%task_id, %fire_at, "notification time is in the past, not scheduled");
            return Ok(ScheduleOutcome::SkippedPast);
        }

        let runtime = Handle::try_current()
            .map_err(|e| ScheduleError::TimerUnavailable(e.to_string()))?;
        let delay = (fire_at - now)
            .to_std()
            .map_err(|e| ScheduleError::TimerUnavailable(e.to_string()))?;
        let deadline = tokio::time::Instant::now()
            .checked_add(delay)
            .ok_or_else(|| ScheduleError::TimerUnavailable(format!("delay too large: {delay:?}")))?;

        let job_id = self.inner.next_job_id.fetch_add(1, Ordering::Relaxed);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = task_id.to_string();
        let message = message.to_string();

        let mut jobs = self.inner.lock_jobs();
        let replaced = match jobs.remove(task_id) {
            Some(old) => {
                old.handle.abort();
                true
            }
            None => false,
        };
        let handle = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(&key, job_id, message);
            }
        });
        jobs.insert(
            task_id.to_string(),
            Job {
                id: job_id,
                fire_at,
                handle,
            },
        );
        drop(jobs);

        if replaced {
            info!(%task_id, %fire_at, "rescheduled notification");
        } else {
            info!(%task_id, %fire_at, "scheduled notification");
        }
        Ok(ScheduleOutcome::Scheduled { replaced })
    }

    /// Stop and forget the pending job for `task_id`, if any.
    pub fn cancel(&self, task_id: &str) -> CancelOutcome {
        let removed = self.inner.lock_jobs().remove(task_id);
        match removed {
            Some(job) => {
                job.handle.abort();
                self.inner.cancelled.fetch_add(1, Ordering::Relaxed);
                info!(%task_id, "cancelled notification");
                CancelOutcome::Cancelled
            }
            None => {
                debug!(%task_id, "no active notification to cancel");
                CancelOutcome::NotFound
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock_jobs().len()
    }

    pub fn pending_fire_time(&self, task_id: &str) -> Option<DateTime<Utc>> {
        self.inner.lock_jobs().get(task_id).map(|job| job.fire_at)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            pending: self.pending_count(),
            fired: self.inner.fired.load(Ordering::Relaxed),
            cancelled: self.inner.cancelled.load(Ordering::Relaxed),
        }
    }

    /// Abort every pending job. Returns how many were dropped.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<Job> = self.inner.lock_jobs().drain().map(|(_, job)| job).collect();
        for job in &drained {
            job.handle.abort();
        }
        drained.len()
    }
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("pending", &self.pending_count())
            .finish()
    }
}
