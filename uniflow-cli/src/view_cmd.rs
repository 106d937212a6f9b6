use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::PathBuf;
use uniflow_core::time::{local_day, parse_local_deadline_to_utc};
use uniflow_core::{
    build_dashboard, events_to_ics, week_to_events, weekly_calendar, CourseFilter, Priority, Task,
    TaskBook,
};

use crate::app::App;

/// Ids are uuids; eight characters are enough to type back in.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn priority_tag(p: Priority) -> &'static str {
    match p {
        Priority::High => "H",
        Priority::Medium => "M",
        Priority::Low => "L",
    }
}

/// One line per task, as every listing prints it.
pub fn task_line(book: &TaskBook, task: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    let due = task.due_date.with_timezone(&tz).format("%a %b %-d %H:%M");
    let mut line = format!(
        "{}  [{}] {} ({}) due {}",
        short_id(&task.id),
        priority_tag(task.priority),
        task.title,
        book.course_label(task.course_id.as_deref()),
        due
    );
    if task.is_completed {
        line.push_str(" [done]");
    } else if task.is_overdue(now) {
        line.push_str(" [overdue]");
    }
    line
}

/// Everything the dashboard prints, so tests can check it without capturing stdout.
pub fn render_dashboard(book: &TaskBook, now: DateTime<Utc>, tz: Tz) -> String {
    let dash = build_dashboard(book.tasks(), now, tz);
    let mut out = String::new();

    out.push_str(&format!(
        "UniFlow dashboard for {} ({})\n\n",
        dash.today.format("%A %b %-d"),
        tz.name()
    ));

    match &dash.analysis.focus_task {
        Some(t) => out.push_str(&format!("Focus: {}\n", task_line(book, t, now, tz))),
        None => out.push_str("Focus: nothing pending\n"),
    }

    if !dash.analysis.deadline_collisions.is_empty() {
        out.push_str("\nDeadline collisions:\n");
        for (day, tasks) in &dash.analysis.deadline_collisions {
            let high = tasks.iter().filter(|t| t.priority == Priority::High).count();
            out.push_str(&format!(
                "  {}: {} tasks ({} high)\n",
                day.format("%a %b %-d"),
                tasks.len(),
                high
            ));
        }
    }

    let sections = [
        ("Due today", &dash.due_today),
        ("Due tomorrow", &dash.due_tomorrow),
        ("Overdue", &dash.overdue),
    ];
    for (label, tasks) in sections {
        out.push_str(&format!("\n{label}:\n"));
        if tasks.is_empty() {
            out.push_str("  (none)\n");
        }
        for t in tasks {
            out.push_str(&format!("  {}\n", task_line(book, t, now, tz)));
        }
    }
    out
}

pub fn render_week(book: &TaskBook, anchor: NaiveDate, app: &App) -> String {
    let now = app.now();
    let week = weekly_calendar(book.tasks(), anchor, app.week_starts_on, app.tz);
    let mut out = String::new();
    for day in &week {
        out.push_str(&format!("{}\n", day.day.format("%a %Y-%m-%d")));
        for t in &day.tasks {
            out.push_str(&format!("  {}\n", task_line(book, t, now, app.tz)));
        }
    }
    out
}

/// Per-course listing. Without a filter, every course in order followed by General.
pub fn render_list(book: &TaskBook, filter: Option<&CourseFilter>, now: DateTime<Utc>, tz: Tz) -> String {
    let filters: Vec<CourseFilter> = match filter {
        Some(f) => vec![f.clone()],
        None => book
            .courses()
            .iter()
            .map(|c| CourseFilter::Course(c.id.clone()))
            .chain(std::iter::once(CourseFilter::General))
            .collect(),
    };

    let mut out = String::new();
    for f in &filters {
        let tasks = book.tasks_for(f);
        if filter.is_none() && tasks.is_empty() {
            continue;
        }
        let label = match f {
            CourseFilter::General => "General",
            CourseFilter::Course(id) => book.course_label(Some(id)),
        };
        out.push_str(&format!("{label}:\n"));
        for t in tasks {
            out.push_str(&format!("  {}\n", task_line(book, t, now, tz)));
        }
    }
    if out.is_empty() {
        out.push_str("No tasks.\n");
    }
    out
}

pub fn dashboard(app: &App, at: Option<String>) -> Result<()> {
    let book = app.load_book()?;
    let now = match at {
        Some(s) => parse_local_deadline_to_utc(&s, app.tz).with_context(|| format!("--at {s}"))?,
        None => app.now(),
    };
    print!("{}", render_dashboard(&book, now, app.tz));
    Ok(())
}

pub fn calendar(app: &App, week_of: Option<String>, ics: bool, out: Option<PathBuf>) -> Result<()> {
    let book = app.load_book()?;
    let anchor = match week_of {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("--week-of expects YYYY-MM-DD, got {s}"))?,
        None => local_day(app.now(), app.tz),
    };

    if !ics {
        print!("{}", render_week(&book, anchor, app));
        return Ok(());
    }

    let week = weekly_calendar(book.tasks(), anchor, app.week_starts_on, app.tz);
    let events = week_to_events(&week, &book);
    let body = events_to_ics(&events);
    match out {
        Some(path) => {
            fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {} events to {}", events.len(), path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}
