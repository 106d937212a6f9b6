//! uniflow-core: task model, dashboard analysis and reminder policy for UniFlow.

pub mod analysis;
pub mod calendar;
pub mod dashboard;
pub mod reminders;
pub mod task;
pub mod task_book;
pub mod time;

pub use analysis::{
    analyze_tasks, compute_focus_task, detect_deadline_collisions, task_score, TaskAnalysis,
};
pub use calendar::{events_to_ics, week_to_events, weekly_calendar, CalendarDay};
pub use dashboard::{build_dashboard, Dashboard};
pub use reminders::{
    plan_for_delete, plan_for_upsert, reminder_message, ReminderPlan, ReminderPolicy,
    ReminderRequest,
};
pub use task::{Course, Priority, Task};
pub use task_book::{CourseFilter, NewTask, TaskBook};
pub use time::{Clock, FixedClock, SystemClock};
