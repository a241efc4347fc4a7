//! Enumerations and field types for task management.
//!
//! This module defines the structured values used to categorise and view tasks:
//! priorities, sort keys, completion filters, display preferences and the
//! week-start policy used when grouping tasks by due date.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[serde(alias = "high")]
    High,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl Priority {
    /// Sort rank: High(1) < Medium(2) < Low(3).
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Input order; the list view groups tasks into due-date sections.
    #[default]
    None,
    Priority,
    DueDate,
    Progress,
}

impl SortKey {
    /// Code stored under the `sortOption` preference key.
    pub fn code(self) -> &'static str {
        match self {
            SortKey::None => "",
            SortKey::Priority => "priority",
            SortKey::DueDate => "dueDate",
            SortKey::Progress => "progress",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "" => Some(SortKey::None),
            "priority" => Some(SortKey::Priority),
            "dueDate" => Some(SortKey::DueDate),
            "progress" => Some(SortKey::Progress),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "Unsorted",
            SortKey::Priority => "Sorted by Priority",
            SortKey::DueDate => "Sorted by Due Date",
            SortKey::Progress => "Sorted by Progress",
        }
    }
}

/// Filtering options for tasks based on completion.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum CompletionFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl CompletionFilter {
    pub fn code(self) -> &'static str {
        match self {
            CompletionFilter::All => "all",
            CompletionFilter::Completed => "completed",
            CompletionFilter::Incomplete => "incomplete",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "all" => Some(CompletionFilter::All),
            "completed" => Some(CompletionFilter::Completed),
            "incomplete" => Some(CompletionFilter::Incomplete),
            _ => None,
        }
    }

    /// Whether a task with the given completion flag passes this filter.
    pub fn matches(self, completed: bool) -> bool {
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Completed => completed,
            CompletionFilter::Incomplete => !completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompletionFilter::All => "All Tasks",
            CompletionFilter::Completed => "Completed",
            CompletionFilter::Incomplete => "Incomplete",
        }
    }
}

/// How much of each task the list view prints.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Detailed,
    /// Titles only, except for tasks the user expanded.
    Simplified,
}

impl ViewMode {
    pub fn code(self) -> &'static str {
        match self {
            ViewMode::Detailed => "detailed",
            ViewMode::Simplified => "simplified",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "detailed" => Some(ViewMode::Detailed),
            "simplified" => Some(ViewMode::Simplified),
            _ => None,
        }
    }
}

/// Colour theme for terminal output.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn code(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// First day of the calendar week, used for the "this week" section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

/// Countdown presets offered by the timer.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TimerKind {
    Pomodoro,
    ShortBreak,
    LongBreak,
    Custom,
}

impl TimerKind {
    pub fn label(self) -> &'static str {
        match self {
            TimerKind::Pomodoro => "Pomodoro",
            TimerKind::ShortBreak => "Short Break",
            TimerKind::LongBreak => "Long Break",
            TimerKind::Custom => "Custom",
        }
    }
}
