//! Dashboard decision support: the focus-task ranking and deadline-collision detection.
//!
//! Both passes are pure functions of the task slice, the current instant and the local
//! timezone. They are recomputed from scratch whenever the task set changes; nothing here
//! is cached or mutated in place.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};
use crate::time::local_day;

/// A day is flagged when at least this many High tasks fall on it...
pub const COLLISION_HIGH_PRIORITY_MIN: usize = 2;
/// ...or when at least this many tasks of any priority do.
pub const COLLISION_TOTAL_MIN: usize = 4;

pub fn priority_weight(priority: Priority) -> i32 {
    match priority {
        Priority::High => 10,
        Priority::Medium => 5,
        Priority::Low => 1,
    }
}

/// Score boost for a deadline `days` calendar days away (negative = overdue).
pub fn proximity_weight(days: i64) -> i32 {
    match days {
        d if d < 0 => 15,
        0 => 10,
        1..=3 => 5,
        4..=7 => 2,
        _ => 0,
    }
}

/// Whole calendar days between today and the task's due day, both taken in `tz`.
/// Time of day is ignored.
pub fn days_until_due(task: &Task, now: DateTime<Utc>, tz: Tz) -> i64 {
    (local_day(task.due_date, tz) - local_day(now, tz)).num_days()
}

pub fn task_score(task: &Task, now: DateTime<Utc>, tz: Tz) -> i32 {
    priority_weight(task.priority) + proximity_weight(days_until_due(task, now, tz))
}

/// The single incomplete task with the highest score.
///
/// Ties go to the task that appears first in `tasks`. Returns `None` when nothing is pending.
pub fn compute_focus_task(tasks: &[Task], now: DateTime<Utc>, tz: Tz) -> Option<&Task> {
    let mut best: Option<(&Task, i32)> = None;
    for task in tasks.iter().filter(|t| !t.is_completed) {
        let score = task_score(task, now, tz);
        // Strictly greater: an equal score never displaces an earlier task.
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((task, score));
        }
    }
    best.map(|(t, _)| t)
}

/// Incomplete tasks grouped by local due day, keeping only the crowded days.
///
/// A day is kept iff it has at least [`COLLISION_HIGH_PRIORITY_MIN`] High tasks or at least
/// [`COLLISION_TOTAL_MIN`] tasks in total. Each group keeps input order.
pub fn detect_deadline_collisions(tasks: &[Task], tz: Tz) -> BTreeMap<NaiveDate, Vec<&Task>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| !t.is_completed) {
        by_day.entry(local_day(task.due_date, tz)).or_default().push(task);
    }

    by_day.retain(|_, group| {
        let high = group.iter().filter(|t| t.priority == Priority::High).count();
        high >= COLLISION_HIGH_PRIORITY_MIN || group.len() >= COLLISION_TOTAL_MIN
    });
    by_day
}

/// Owned analysis snapshot, as rendered on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalysis {
    pub focus_task: Option<Task>,
    pub deadline_collisions: BTreeMap<NaiveDate, Vec<Task>>,
}

pub fn analyze_tasks(tasks: &[Task], now: DateTime<Utc>, tz: Tz) -> TaskAnalysis {
    TaskAnalysis {
        focus_task: compute_focus_task(tasks, now, tz).cloned(),
        deadline_collisions: detect_deadline_collisions(tasks, tz)
            .into_iter()
            .map(|(day, group)| (day, group.into_iter().cloned().collect()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, due: DateTime<Utc>) -> Task {
        Task::new(id, id, due).with_priority(priority)
    }

    fn at(day_offset: i64, hour: u32) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
        base + Duration::days(day_offset)
    }

    #[test]
    fn proximity_buckets() {
        assert_eq!(proximity_weight(-3), 15);
        assert_eq!(proximity_weight(0), 10);
        assert_eq!(proximity_weight(1), 5);
        assert_eq!(proximity_weight(3), 5);
        assert_eq!(proximity_weight(4), 2);
        assert_eq!(proximity_weight(7), 2);
        assert_eq!(proximity_weight(8), 0);
    }

    #[test]
    fn days_until_due_ignores_time_of_day() {
        // Due at 23:00 today and due at 00:30 tomorrow differ by one calendar day,
        // even though they are 90 minutes apart.
        let late_today = task("a", Priority::Low, at(0, 23));
        let early_tomorrow = task("b", Priority::Low, at(1, 0) + Duration::minutes(30));
        assert_eq!(days_until_due(&late_today, now(), Tz::UTC), 0);
        assert_eq!(days_until_due(&early_tomorrow, now(), Tz::UTC), 1);

        // Earlier today than "now" is still today, not overdue.
        let earlier_today = task("c", Priority::Low, at(0, 1));
        assert_eq!(days_until_due(&earlier_today, now(), Tz::UTC), 0);
    }

    #[test]
    fn focus_none_when_everything_done() {
        let tasks = vec![task("a", Priority::High, at(0, 9)).completed()];
        assert!(compute_focus_task(&tasks, now(), Tz::UTC).is_none());
        assert!(compute_focus_task(&[], now(), Tz::UTC).is_none());
    }

    #[test]
    fn overdue_medium_beats_high_due_in_two_days() {
        let a = task("a", Priority::High, at(2, 12));
        let b = task("b", Priority::Medium, at(-1, 12));
        assert_eq!(task_score(&a, now(), Tz::UTC), 15);
        assert_eq!(task_score(&b, now(), Tz::UTC), 20);

        let tasks = vec![a, b];
        let focus = compute_focus_task(&tasks, now(), Tz::UTC).unwrap();
        assert_eq!(focus.id, "b");
    }

    #[test]
    fn ties_go_to_first_in_input_order() {
        let tasks = vec![
            task("late-done", Priority::High, at(0, 7)).completed(),
            task("first", Priority::High, at(1, 18)),
            task("second", Priority::High, at(3, 9)),
        ];
        for _ in 0..5 {
            let focus = compute_focus_task(&tasks, now(), Tz::UTC).unwrap();
            assert_eq!(focus.id, "first");
        }

        let reversed: Vec<Task> = tasks.iter().rev().cloned().collect();
        let focus = compute_focus_task(&reversed, now(), Tz::UTC).unwrap();
        assert_eq!(focus.id, "second");
    }

    #[test]
    fn focus_score_dominates_all_incomplete_tasks() {
        let tasks = vec![
            task("a", Priority::Low, at(-4, 9)),
            task("b", Priority::High, at(0, 9)),
            task("c", Priority::Medium, at(5, 9)),
            task("d", Priority::High, at(12, 9)),
            task("e", Priority::High, at(-1, 9)).completed(),
        ];
        let focus = compute_focus_task(&tasks, now(), Tz::UTC).unwrap();
        let best = task_score(focus, now(), Tz::UTC);
        for t in tasks.iter().filter(|t| !t.is_completed) {
            assert!(best >= task_score(t, now(), Tz::UTC));
        }
        assert_eq!(focus.id, "b");
    }

    #[test]
    fn two_high_tasks_on_one_day_collide() {
        let tasks = vec![
            task("h1", Priority::High, at(0, 9)),
            task("h2", Priority::High, at(0, 11)),
            task("l1", Priority::Low, at(0, 14)),
        ];
        let collisions = detect_deadline_collisions(&tasks, Tz::UTC);
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(collisions.len(), 1);
        let ids: Vec<&str> = collisions[&day].iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["h1", "h2", "l1"]);
    }

    #[test]
    fn four_low_tasks_on_one_day_collide() {
        let tasks: Vec<Task> = (0..4)
            .map(|i| task(&format!("l{i}"), Priority::Low, at(1, 8 + i)))
            .collect();
        let collisions = detect_deadline_collisions(&tasks, Tz::UTC);
        let day = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert_eq!(collisions[&day].len(), 4);
    }

    #[test]
    fn quiet_days_and_completed_tasks_are_left_out() {
        let tasks = vec![
            // One High plus two Low: neither rule holds.
            task("h1", Priority::High, at(0, 9)),
            task("l1", Priority::Low, at(0, 10)),
            task("l2", Priority::Low, at(0, 11)),
            // Second High is done, so it does not count.
            task("h2", Priority::High, at(0, 12)).completed(),
            // Different day, lone task.
            task("m1", Priority::Medium, at(4, 9)),
        ];
        let collisions = detect_deadline_collisions(&tasks, Tz::UTC);
        assert!(collisions.is_empty());
    }

    #[test]
    fn completed_tasks_never_appear_in_groups() {
        let tasks = vec![
            task("h1", Priority::High, at(0, 9)),
            task("h2", Priority::High, at(0, 10)),
            task("h3", Priority::High, at(0, 11)).completed(),
        ];
        let collisions = detect_deadline_collisions(&tasks, Tz::UTC);
        for group in collisions.values() {
            assert!(group.iter().all(|t| !t.is_completed));
            assert_eq!(group.len(), 2);
        }
    }

    #[test]
    fn grouping_uses_local_days() {
        let chicago: Tz = "America/Chicago".parse().unwrap();
        // 03:00 UTC on Mar 3 is the evening of Mar 2 in Chicago.
        let tasks = vec![
            task("h1", Priority::High, Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap()),
            task("h2", Priority::High, Utc.with_ymd_and_hms(2026, 3, 3, 3, 0, 0).unwrap()),
        ];
        assert!(detect_deadline_collisions(&tasks, Tz::UTC).is_empty());

        let local = detect_deadline_collisions(&tasks, chicago);
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(local[&day].len(), 2);
    }

    #[test]
    fn analysis_snapshot_serializes_day_keys() {
        let tasks = vec![
            task("h1", Priority::High, at(0, 9)),
            task("h2", Priority::High, at(0, 11)),
        ];
        let analysis = analyze_tasks(&tasks, now(), Tz::UTC);
        assert_eq!(analysis.focus_task.as_ref().map(|t| t.id.as_str()), Some("h1"));

        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("\"focusTask\":"));
        assert!(json.contains("\"deadlineCollisions\":{\"2026-03-02\":["));
    }
}
