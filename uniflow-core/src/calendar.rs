use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::task_book::TaskBook;
use crate::time::local_day;

/// Length of the block an exported task occupies, ending at its deadline.
const ICS_BLOCK_MINUTES: i64 = 15;

/// First day of the week containing `day`.
pub fn start_of_week(day: NaiveDate, week_starts_on: Weekday) -> NaiveDate {
    let back = (7 + day.weekday().num_days_from_monday() - week_starts_on.num_days_from_monday()) % 7;
    day - Duration::days(back as i64)
}

/// The seven consecutive days of the week containing `anchor`.
pub fn week_days(anchor: NaiveDate, week_starts_on: Weekday) -> Vec<NaiveDate> {
    let start = start_of_week(anchor, week_starts_on);
    (0..7).map(|i| start + Duration::days(i)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: NaiveDate,
    /// All tasks due this local day, completed ones included, earliest deadline first.
    pub tasks: Vec<Task>,
}

/// Weekly calendar grid: one entry per day of the week containing `anchor`.
pub fn weekly_calendar(
    tasks: &[Task],
    anchor: NaiveDate,
    week_starts_on: Weekday,
    tz: Tz,
) -> Vec<CalendarDay> {
    week_days(anchor, week_starts_on)
        .into_iter()
        .map(|day| {
            let mut due: Vec<Task> = tasks
                .iter()
                .filter(|t| local_day(t.due_date, tz) == day)
                .cloned()
                .collect();
            // Stable: equal deadlines keep insertion order.
            due.sort_by_key(|t| t.due_date);
            CalendarDay { day, tasks: due }
        })
        .collect()
}

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// Turn the open tasks of a calendar week into short blocks that end at each deadline.
pub fn week_to_events(week: &[CalendarDay], book: &TaskBook) -> Vec<CalendarEvent> {
    week.iter()
        .flat_map(|d| d.tasks.iter())
        .filter(|t| !t.is_completed)
        .map(|t| CalendarEvent {
            uid: format!("uniflow-{}@uniflow", t.id),
            start_utc: t.due_date - Duration::minutes(ICS_BLOCK_MINUTES),
            end_utc: t.due_date,
            summary: format!("[{}] {}", book.course_label(t.course_id.as_deref()), t.title),
            description: format!("TaskId: {}\nPriority: {}\n", t.id, t.priority),
        })
        .collect()
}

/// Emit a minimal ICS calendar containing VEVENT blocks.
///
/// DTSTART/DTEND are UTC. UIDs derive from task ids so re-imports update in place.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//UniFlow//EN\n");

    for e in events {
        let dtstart = e.start_utc.format("%Y%m%dT%H%M%SZ");
        let dtend = e.end_utc.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTART:{}\n", dtstart));
        s.push_str(&format!("DTEND:{}\n", dtend));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
