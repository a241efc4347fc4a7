//! Command-line entry point: global flags and the subcommand enum.

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal to-do list with subtasks, due-date sections and a Pomodoro timer.
/// Data lives in ~/.tideline unless --data-dir or TIDELINE_DIR says otherwise.
#[derive(Parser)]
#[command(name = "tide", version, about = "To-do lists with subtasks and a Pomodoro timer")]
pub struct Cli {
    /// Directory holding tasks.json, settings.json and config.toml.
    #[arg(long, global = true, env = "TIDELINE_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
