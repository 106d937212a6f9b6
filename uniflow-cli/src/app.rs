//! Per-invocation context shared by the commands: where data lives, the loaded config, the
//! clock and the reminder client.

use anyhow::Result;
use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uniflow_core::{
    analyze_tasks, plan_for_delete, plan_for_upsert, Clock, ReminderPlan, SystemClock, Task,
    TaskAnalysis, TaskBook,
};
use uniflow_reminder::ReminderClient;

use crate::config::{config_path, load_config, Config};
use crate::state::{data_path, ensure_dir, load_book, save_book, uniflow_home};
use crate::view_cmd::task_line;

pub struct App {
    pub home: PathBuf,
    pub config: Config,
    pub tz: Tz,
    pub week_starts_on: Weekday,
    clock: Arc<dyn Clock>,
    reminders: Option<ReminderClient>,
}

impl App {
    pub fn load(home_override: Option<&Path>) -> Result<Self> {
        let home = uniflow_home(home_override)?;
        ensure_dir(&home)?;
        let config = load_config(&config_path(&home))?;
        Self::new(home, config, Arc::new(SystemClock))
    }

    pub fn new(home: PathBuf, config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let reminders = if config.reminders.enabled {
            Some(ReminderClient::new(
                &config.reminders.base_url,
                config.reminder_timeout(),
                config.reminders.retries,
            )?)
        } else {
            None
        };
        Ok(Self {
            tz: config.timezone()?,
            week_starts_on: config.week_starts_on()?,
            home,
            config,
            clock,
            reminders,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn data_path(&self) -> PathBuf {
        data_path(&self.home)
    }

    pub fn load_book(&self) -> Result<TaskBook> {
        load_book(&self.data_path())
    }

    pub fn save_book(&self, book: &TaskBook) -> Result<()> {
        save_book(&self.data_path(), book)
    }

    pub fn analyze(&self, book: &TaskBook) -> TaskAnalysis {
        analyze_tasks(book.tasks(), self.now(), self.tz)
    }

    /// Print what deserves attention now that the book has changed.
    pub fn report_analysis(&self, book: &TaskBook) -> TaskAnalysis {
        let analysis = self.analyze(book);
        match &analysis.focus_task {
            Some(task) => println!("Focus: {}", task_line(book, task, self.now(), self.tz)),
            None => println!("Focus: nothing pending"),
        }
        for (day, tasks) in &analysis.deadline_collisions {
            println!(
                "Heads up: {} tasks due on {}",
                tasks.len(),
                day.format("%a %b %-d")
            );
        }
        analysis
    }

    /// Bring the reminder service in line with a created or edited task.
    pub async fn sync_reminder(&self, task: &Task) -> bool {
        let plan = plan_for_upsert(task, self.now(), self.config.reminder_policy());
        self.apply(&plan).await
    }

    pub async fn drop_reminder(&self, task_id: &str) -> bool {
        self.apply(&plan_for_delete(task_id)).await
    }

    async fn apply(&self, plan: &ReminderPlan) -> bool {
        match &self.reminders {
            Some(client) => client.apply(plan).await,
            None => {
                debug!(task_id = %plan.task_id(), "reminders disabled; skipping");
                false
            }
        }
    }
}
