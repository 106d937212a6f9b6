//! Dashboard snapshot: focus task, collision warnings, and what is due today and tomorrow.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::analysis::{analyze_tasks, TaskAnalysis};
use crate::task::Task;
use crate::time::local_day;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub analysis: TaskAnalysis,
    pub due_today: Vec<Task>,
    pub due_tomorrow: Vec<Task>,
    /// Open tasks whose deadline has passed, in input order.
    pub overdue: Vec<Task>,
}

pub fn build_dashboard(tasks: &[Task], now: DateTime<Utc>, tz: Tz) -> Dashboard {
    let today = local_day(now, tz);
    let tomorrow = today + Duration::days(1);
    let due_on = |day: NaiveDate| -> Vec<Task> {
        tasks
            .iter()
            .filter(|t| local_day(t.due_date, tz) == day)
            .cloned()
            .collect()
    };

    Dashboard {
        today,
        analysis: analyze_tasks(tasks, now, tz),
        due_today: due_on(today),
        due_tomorrow: due_on(tomorrow),
        overdue: tasks.iter().filter(|t| t.is_overdue(now)).cloned().collect(),
    }
}
