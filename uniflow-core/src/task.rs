//! Task and course model shared by the analysis engine, the task book and the CLI.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => bail!("unknown priority '{other}' (expected high, medium or low)"),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deadline-bearing unit of work.
///
/// Field names serialize in camelCase so records stay compatible with the web client's export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,

    /// `None` means a general task with no course.
    #[serde(default)]
    pub course_id: Option<String>,

    pub due_date: DateTime<Utc>,
    pub priority: Priority,

    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            course_id: None,
            due_date,
            priority: Priority::Medium,
            is_completed: false,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    /// Past its deadline and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date < now
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("task id must be non-empty");
        }
        if self.title.trim().is_empty() {
            bail!("task title must be non-empty");
        }
        Ok(())
    }
}

/// A course groups tasks; `color` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Course {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("course id must be non-empty");
        }
        if self.name.trim().is_empty() {
            bail!("course name must be non-empty");
        }
        Ok(())
    }
}
