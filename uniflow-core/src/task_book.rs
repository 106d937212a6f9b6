//! TaskBook: the user's courses and tasks.
//!
//! Plain keyed records with no scheduling logic. Insertion order is kept: it is the order the
//! analysis engine sees, so it decides focus-task ties.
//!
//! Deleting a course deletes its tasks too. Callers get the removed tasks back so they can
//! cancel their reminders.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Course, Priority, Task};

/// Fields a user supplies when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub course_id: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
}

/// Which tasks a per-course list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFilter {
    /// Tasks with no course.
    General,
    Course(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBook {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Resolve a task by full id or unique id prefix (the CLI prints short ids).
    pub fn resolve_task_id(&self, id_or_prefix: &str) -> Result<String> {
        resolve_prefix(self.tasks.iter().map(|t| t.id.as_str()), id_or_prefix, "task")
    }

    pub fn resolve_course_id(&self, id_or_prefix: &str) -> Result<String> {
        resolve_prefix(self.courses.iter().map(|c| c.id.as_str()), id_or_prefix, "course")
    }

    pub fn add_task(&mut self, new: NewTask) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            course_id: new.course_id,
            due_date: new.due_date,
            priority: new.priority,
            is_completed: false,
        };
        self.check_task(&task)?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Replace the stored task with the same id, keeping its position. The title is trimmed
    /// the same way [`add_task`](Self::add_task) trims it.
    pub fn update_task(&mut self, mut task: Task) -> Result<Task> {
        task.title = task.title.trim().to_string();
        self.check_task(&task)?;
        let slot = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .with_context(|| format!("no task with id {}", task.id))?;
        *slot = task.clone();
        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .with_context(|| format!("no task with id {id}"))?;
        Ok(self.tasks.remove(idx))
    }

    pub fn toggle_completion(&mut self, id: &str) -> Result<Task> {
        let mut task = self
            .task(id)
            .cloned()
            .with_context(|| format!("no task with id {id}"))?;
        task.is_completed = !task.is_completed;
        self.update_task(task)
    }

    pub fn add_course(&mut self, name: &str, color: &str) -> Result<Course> {
        let course = Course {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            color: color.trim().to_string(),
        };
        course.validate()?;
        self.courses.push(course.clone());
        Ok(course)
    }

    pub fn update_course(&mut self, course: Course) -> Result<Course> {
        course.validate()?;
        let slot = self
            .courses
            .iter_mut()
            .find(|c| c.id == course.id)
            .with_context(|| format!("no course with id {}", course.id))?;
        *slot = course.clone();
        Ok(course)
    }

    /// Remove a course and every task assigned to it.
    pub fn delete_course(&mut self, id: &str) -> Result<(Course, Vec<Task>)> {
        let idx = self
            .courses
            .iter()
            .position(|c| c.id == id)
            .with_context(|| format!("no course with id {id}"))?;
        let course = self.courses.remove(idx);

        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.course_id.as_deref() == Some(id));
        self.tasks = kept;

        Ok((course, removed))
    }

    pub fn tasks_for(&self, filter: &CourseFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| match filter {
                CourseFilter::General => t.course_id.is_none(),
                CourseFilter::Course(id) => t.course_id.as_deref() == Some(id.as_str()),
            })
            .collect()
    }

    /// Display name for a task's course ("General" when unassigned or dangling).
    pub fn course_label(&self, course_id: Option<&str>) -> &str {
        course_id
            .and_then(|id| self.course(id))
            .map(|c| c.name.as_str())
            .unwrap_or("General")
    }

    fn check_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        if let Some(cid) = task.course_id.as_deref() {
            if self.course(cid).is_none() {
                bail!("unknown course id {cid}");
            }
        }
        Ok(())
    }
}

fn resolve_prefix<'a>(
    ids: impl Iterator<Item = &'a str>,
    needle: &str,
    kind: &str,
) -> Result<String> {
    let needle = needle.trim();
    if needle.is_empty() {
        bail!("{kind} id must be non-empty");
    }
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(needle)).collect();
    if let Some(exact) = matches.iter().find(|id| **id == needle) {
        return Ok(exact.to_string());
    }
    match matches.as_slice() {
        [] => bail!("no {kind} matches '{needle}'"),
        [one] => Ok(one.to_string()),
        many => bail!("'{needle}' is ambiguous: matches {} {kind}s", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 17, 0, 0).unwrap()
    }

    fn new_task(title: &str, course_id: Option<&str>) -> NewTask {
        NewTask {
            title: title.to_string(),
            course_id: course_id.map(str::to_string),
            due_date: due(),
            priority: Priority::Medium,
        }
    }

    #[test]
    fn add_task_assigns_id_and_open_status() {
        let mut book = TaskBook::new();
        let t = book.add_task(new_task("  Read ch. 4 ", None)).unwrap();
        assert!(!t.id.is_empty());
        assert_eq!(t.title, "Read ch. 4");
        assert!(!t.is_completed);
        assert_eq!(book.tasks().len(), 1);
    }

    #[test]
    fn add_task_rejects_unknown_course_and_blank_title() {
        let mut book = TaskBook::new();
        assert!(book.add_task(new_task("x", Some("nope"))).is_err());
        assert!(book.add_task(new_task("   ", None)).is_err());
        assert!(book.tasks().is_empty());
    }

    #[test]
    fn update_keeps_position() {
        let mut book = TaskBook::new();
        let a = book.add_task(new_task("a", None)).unwrap();
        let b = book.add_task(new_task("b", None)).unwrap();

        let mut edited = a.clone();
        edited.title = "a2".into();
        book.update_task(edited).unwrap();

        assert_eq!(book.tasks()[0].title, "a2");
        assert_eq!(book.tasks()[1].id, b.id);
    }

    #[test]
    fn edited_title_is_trimmed_like_a_new_one() {
        let mut book = TaskBook::new();
        let created = book.add_task(new_task("  Essay  ", None)).unwrap();

        let mut edited = created.clone();
        edited.title = "  Essay final \n".into();
        let saved = book.update_task(edited).unwrap();
        assert_eq!(saved.title, "Essay final");
        assert_eq!(book.tasks()[0].title, "Essay final");

        let mut blank = saved.clone();
        blank.title = "   ".into();
        assert!(book.update_task(blank).is_err());
        assert_eq!(book.tasks()[0].title, "Essay final");
    }

    #[test]
    fn toggle_flips_completion_both_ways() {
        let mut book = TaskBook::new();
        let t = book.add_task(new_task("a", None)).unwrap();
        assert!(book.toggle_completion(&t.id).unwrap().is_completed);
        assert!(!book.toggle_completion(&t.id).unwrap().is_completed);
        assert!(book.toggle_completion("missing").is_err());
    }

    #[test]
    fn delete_course_cascades_to_its_tasks() {
        let mut book = TaskBook::new();
        let os = book.add_course("Operating Systems", "#ef4444").unwrap();
        let db = book.add_course("Databases", "#10b981").unwrap();
        book.add_task(new_task("pset", Some(&os.id))).unwrap();
        book.add_task(new_task("lab", Some(&os.id))).unwrap();
        let keep = book.add_task(new_task("er diagram", Some(&db.id))).unwrap();
        let general = book.add_task(new_task("laundry", None)).unwrap();

        let (course, removed) = book.delete_course(&os.id).unwrap();
        assert_eq!(course.name, "Operating Systems");
        assert_eq!(removed.len(), 2);

        let ids: Vec<&str> = book.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![keep.id.as_str(), general.id.as_str()]);
    }

    #[test]
    fn course_filter_separates_general_tasks() {
        let mut book = TaskBook::new();
        let os = book.add_course("OS", "#ef4444").unwrap();
        book.add_task(new_task("pset", Some(&os.id))).unwrap();
        book.add_task(new_task("laundry", None)).unwrap();

        let general = book.tasks_for(&CourseFilter::General);
        assert_eq!(general.len(), 1);
        assert_eq!(general[0].title, "laundry");

        let course = book.tasks_for(&CourseFilter::Course(os.id.clone()));
        assert_eq!(course.len(), 1);
        assert_eq!(book.course_label(course[0].course_id.as_deref()), "OS");
        assert_eq!(book.course_label(None), "General");
    }

    #[test]
    fn resolves_unique_prefixes() {
        let mut book = TaskBook::new();
        book.tasks.push(Task::new("abc123", "one", due()));
        book.tasks.push(Task::new("abd456", "two", due()));

        assert_eq!(book.resolve_task_id("abc").unwrap(), "abc123");
        assert!(book.resolve_task_id("ab").is_err());
        assert!(book.resolve_task_id("zz").is_err());
    }

    #[test]
    fn book_json_roundtrip() {
        let mut book = TaskBook::new();
        let c = book.add_course("Calculus", "#6366f1").unwrap();
        book.add_task(new_task("limits", Some(&c.id))).unwrap();

        let json = serde_json::to_string(&book).unwrap();
        let back: TaskBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, book);

        let empty: TaskBook = serde_json::from_str("{}").unwrap();
        assert!(empty.tasks().is_empty());
    }
}
