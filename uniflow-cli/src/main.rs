use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uniflow_core::SystemClock;
use uniflow_reminder::{serve, LogNotifier, ReminderScheduler};

mod app;
mod config;
mod state;
mod task_cmd;
mod view_cmd;

use app::App;
use config::{config_path, init_config, show_config};
use state::{ensure_dir, uniflow_home};
use task_cmd::{CourseCommand, TaskCommand};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("UNIFLOW_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "uniflow", version = VERSION, about = "UniFlow student task tracker")]
struct Cli {
    /// Data directory (default: $UNIFLOW_HOME or ~/.uniflow)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reminder service until Ctrl-C
    Serve {
        /// Listen address (default: server.bind from config)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Create, edit, complete and list tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        command: CourseCommand,
    },

    /// Focus task, deadline collisions, and what is due today and tomorrow
    Dashboard {
        /// Evaluate as of this local time instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Weekly calendar view
    Calendar {
        /// Any day in the week to show, YYYY-MM-DD (default: today)
        #[arg(long)]
        week_of: Option<String>,

        /// Emit the week's open tasks as ICS instead
        #[arg(long, default_value_t = false)]
        ics: bool,

        /// With --ics, write to this file instead of stdout
        #[arg(long, requires = "ics")]
        out: Option<PathBuf>,
    },

    /// Config helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write default config.toml if missing
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics on stderr; stdout is the command's output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("warn,uniflow_cli=info,uniflow_reminder=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Config { command } => {
            let home = uniflow_home(cli.home.as_deref())?;
            ensure_dir(&home)?;
            let path = config_path(&home);
            match command {
                ConfigCommand::Init => init_config(&path)?,
                ConfigCommand::Show => show_config(&path)?,
            }
        }

        Command::Serve { bind } => {
            let app = App::load(cli.home.as_deref())?;
            let addr = match bind {
                Some(addr) => addr,
                None => app.config.bind_addr()?,
            };
            let scheduler = ReminderScheduler::new(Arc::new(SystemClock), Arc::new(LogNotifier));
            serve(addr, scheduler).await?;
        }

        Command::Task { command } => {
            let app = App::load(cli.home.as_deref())?;
            task_cmd::run_task(&app, command).await?;
        }

        Command::Course { command } => {
            let app = App::load(cli.home.as_deref())?;
            task_cmd::run_course(&app, command).await?;
        }

        Command::Dashboard { at } => {
            let app = App::load(cli.home.as_deref())?;
            view_cmd::dashboard(&app, at)?;
        }

        Command::Calendar { week_of, ics, out } => {
            let app = App::load(cli.home.as_deref())?;
            view_cmd::calendar(&app, week_of, ics, out)?;
        }
    }

    Ok(())
}
