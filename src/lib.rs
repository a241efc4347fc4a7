//! Task model, aggregation engine and storage behind the `tide` CLI.
//!
//! [`engine`] holds the pure derivations (progress, sorting, filtering,
//! due-date sections, search); [`store::TaskStore`] owns and persists the task
//! list; [`settings`] keeps display preferences apart from the tasks.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod format;
pub mod settings;
pub mod store;
pub mod task;
pub mod timer;
