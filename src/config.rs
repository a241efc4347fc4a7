//! Configuration file and data directory layout.
//!
//! Everything lives in one directory (`~/.tideline` unless overridden):
//! `tasks.json`, `settings.json` and an optional `config.toml`. Missing config
//! keys take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::fields::{Priority, WeekStart};

pub const TASKS_FILE: &str = "tasks.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const CONFIG_FILE: &str = "config.toml";

/// Countdown lengths for the timer presets, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerPresets {
    pub pomodoro_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for TimerPresets {
    fn default() -> Self {
        TimerPresets {
            pomodoro_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First day of the week for the "This Week" section.
    pub week_start: WeekStart,
    /// Category used by `add` when none is given.
    pub default_category: String,
    pub default_priority: Priority,
    pub timer: TimerPresets,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            week_start: WeekStart::Sunday,
            default_category: "Work".to_string(),
            default_priority: Priority::Medium,
            timer: TimerPresets::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the data directory, or the defaults if absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        fs::write(data_dir.join(CONFIG_FILE), toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let t = &self.timer;
        for minutes in [t.pomodoro_minutes, t.short_break_minutes, t.long_break_minutes] {
            if minutes == 0 {
                return Err(AppError::invalid_input("timer presets must be at least one minute"));
            }
            if minutes.checked_mul(60).is_none() {
                return Err(AppError::invalid_input(format!("timer preset of {minutes} minutes is too long")));
            }
        }
        if self.default_category.trim().is_empty() {
            return Err(AppError::invalid_input("default_category cannot be empty"));
        }
        Ok(())
    }
}

/// Resolve the data directory: explicit flag or env, else `~/.tideline`.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tideline"),
    }
}
