//! # Tide - to-do lists in the terminal
//!
//! A command-line to-do list built around tasks with subtasks. Progress is
//! derived from subtask completion, tasks are grouped into "due today / this
//! week / upcoming" sections, and a Pomodoro-style timer is built in.
//!
//! ## Key Features
//!
//! - **Subtask-driven progress**: a task is complete exactly when all of its subtasks are
//! - **Due-date sections**: today, the rest of the week, and everything after
//! - **Sorting and filtering**: by priority, due date or progress; by category and completion
//! - **Search and calendar views**: title search and a month view with due-date markers
//! - **Attachments**: keep file references on a task
//! - **Timer**: 25/5/15 minute presets or a custom length
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task with two subtasks
//! tide add "Buy groceries" -s milk -s bread --due tomorrow --priority high -c Errands
//!
//! # List tasks in due-date sections
//! tide list
//!
//! # Tick off the first subtask
//! tide toggle "Buy groceries" 1
//!
//! # Sort by progress from now on
//! tide list --sort progress
//!
//! # Start a Pomodoro
//! tide timer
//! ```
//!
//! Data is stored in `~/.tideline/` (`tasks.json`, `settings.json`, optional
//! `config.toml`). Set `RUST_LOG=debug` to see what each command does.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tideline::cli::Cli;
use tideline::cmd::*;
use tideline::config;

fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions don't need the data directory.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let data_dir = config::data_dir(cli.data_dir.as_deref());
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, data_dir) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
