//! Task and course mutations.
//!
//! Every mutation persists the book first, then re-runs the analysis and prints the new focus
//! task, then tells the reminder service. A reminder failure never undoes a saved change.

use anyhow::{Context, Result};
use clap::Subcommand;
use uniflow_core::time::parse_local_deadline_to_utc;
use uniflow_core::{CourseFilter, NewTask, Priority};

use crate::app::App;
use crate::view_cmd::{render_list, short_id, task_line};

const DEFAULT_COURSE_COLOR: &str = "#4f46e5";

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        title: String,

        /// Deadline in local time ("2026-03-04 23:59") or RFC3339
        #[arg(long)]
        due: String,

        /// high | medium | low
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Course id or id prefix (omit for General)
        #[arg(long)]
        course: Option<String>,
    },

    /// Change fields of an existing task
    Edit {
        /// Task id or id prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long, conflicts_with = "general")]
        course: Option<String>,

        /// Move the task to General
        #[arg(long, default_value_t = false)]
        general: bool,
    },

    /// Mark a task completed
    Done { id: String },

    /// Mark a completed task open again
    Undo { id: String },

    /// Delete a task
    Rm { id: String },

    /// List tasks grouped by course
    List {
        /// Only this course
        #[arg(long, conflicts_with = "general")]
        course: Option<String>,

        /// Only tasks without a course
        #[arg(long, default_value_t = false)]
        general: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// Add a course
    Add {
        name: String,

        #[arg(long, default_value = DEFAULT_COURSE_COLOR)]
        color: String,
    },

    /// Rename or recolor a course
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a course and all of its tasks
    Rm { id: String },

    /// List courses with their open task counts
    List,
}

pub async fn run_task(app: &App, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            title,
            due,
            priority,
            course,
        } => add_task(app, title, &due, priority, course).await,
        TaskCommand::Edit {
            id,
            title,
            due,
            priority,
            course,
            general,
        } => edit_task(app, &id, title, due, priority, course, general).await,
        TaskCommand::Done { id } => set_completed(app, &id, true).await,
        TaskCommand::Undo { id } => set_completed(app, &id, false).await,
        TaskCommand::Rm { id } => remove_task(app, &id).await,
        TaskCommand::List { course, general } => list_tasks(app, course, general),
    }
}

pub async fn run_course(app: &App, cmd: CourseCommand) -> Result<()> {
    match cmd {
        CourseCommand::Add { name, color } => {
            let mut book = app.load_book()?;
            let course = book.add_course(&name, &color)?;
            app.save_book(&book)?;
            println!("Added course {} {}", short_id(&course.id), course.name);
            Ok(())
        }
        CourseCommand::Edit { id, name, color } => {
            let mut book = app.load_book()?;
            let id = book.resolve_course_id(&id)?;
            let mut course = book.course(&id).cloned().context("course vanished")?;
            if let Some(name) = name {
                course.name = name;
            }
            if let Some(color) = color {
                course.color = color;
            }
            let course = book.update_course(course)?;
            app.save_book(&book)?;
            println!("Updated course {} {}", short_id(&course.id), course.name);
            Ok(())
        }
        CourseCommand::Rm { id } => remove_course(app, &id).await,
        CourseCommand::List => {
            let book = app.load_book()?;
            if book.courses().is_empty() {
                println!("No courses.");
            }
            for c in book.courses() {
                let open = book
                    .tasks_for(&CourseFilter::Course(c.id.clone()))
                    .iter()
                    .filter(|t| !t.is_completed)
                    .count();
                println!("{}  {} {} ({} open)", short_id(&c.id), c.color, c.name, open);
            }
            Ok(())
        }
    }
}

async fn add_task(
    app: &App,
    title: String,
    due: &str,
    priority: Priority,
    course: Option<String>,
) -> Result<()> {
    let mut book = app.load_book()?;
    let due_date = parse_local_deadline_to_utc(due, app.tz)?;
    let course_id = course.map(|c| book.resolve_course_id(&c)).transpose()?;

    let task = book.add_task(NewTask {
        title,
        course_id,
        due_date,
        priority,
    })?;
    app.save_book(&book)?;
    println!("Added {}", task_line(&book, &task, app.now(), app.tz));

    app.report_analysis(&book);
    app.sync_reminder(&task).await;
    Ok(())
}

async fn edit_task(
    app: &App,
    id: &str,
    title: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
    course: Option<String>,
    general: bool,
) -> Result<()> {
    let mut book = app.load_book()?;
    let id = book.resolve_task_id(id)?;
    let mut task = book.task(&id).cloned().context("task vanished")?;

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(due) = due {
        task.due_date = parse_local_deadline_to_utc(&due, app.tz)?;
    }
    if let Some(priority) = priority {
        task.priority = priority;
    }
    if let Some(course) = course {
        task.course_id = Some(book.resolve_course_id(&course)?);
    } else if general {
        task.course_id = None;
    }

    let task = book.update_task(task)?;
    app.save_book(&book)?;
    println!("Updated {}", task_line(&book, &task, app.now(), app.tz));

    app.report_analysis(&book);
    app.sync_reminder(&task).await;
    Ok(())
}

async fn set_completed(app: &App, id: &str, completed: bool) -> Result<()> {
    let mut book = app.load_book()?;
    let id = book.resolve_task_id(id)?;
    let current = book.task(&id).map(|t| t.is_completed);
    if current == Some(completed) {
        println!("Nothing to do: {} is already {}", short_id(&id), state_word(completed));
        return Ok(());
    }

    let task = book.toggle_completion(&id)?;
    app.save_book(&book)?;
    println!("Marked {}", task_line(&book, &task, app.now(), app.tz));

    app.report_analysis(&book);
    // Completed tasks lose their reminder; reopened ones get it back if still ahead.
    app.sync_reminder(&task).await;
    Ok(())
}

fn state_word(completed: bool) -> &'static str {
    if completed { "done" } else { "open" }
}

async fn remove_task(app: &App, id: &str) -> Result<()> {
    let mut book = app.load_book()?;
    let id = book.resolve_task_id(id)?;
    let task = book.delete_task(&id)?;
    app.save_book(&book)?;
    println!("Deleted {} {}", short_id(&task.id), task.title);

    app.report_analysis(&book);
    app.drop_reminder(&task.id).await;
    Ok(())
}

async fn remove_course(app: &App, id: &str) -> Result<()> {
    let mut book = app.load_book()?;
    let id = book.resolve_course_id(id)?;
    let (course, removed) = book.delete_course(&id)?;
    app.save_book(&book)?;
    println!(
        "Deleted course {} and {} task(s)",
        course.name,
        removed.len()
    );

    app.report_analysis(&book);
    for task in &removed {
        app.drop_reminder(&task.id).await;
    }
    Ok(())
}

fn list_tasks(app: &App, course: Option<String>, general: bool) -> Result<()> {
    let book = app.load_book()?;
    let filter = match course {
        Some(c) => Some(CourseFilter::Course(book.resolve_course_id(&c)?)),
        None if general => Some(CourseFilter::General),
        None => None,
    };
    print!("{}", render_list(&book, filter.as_ref(), app.now(), app.tz));
    Ok(())
}
