//! Task data structure and related functionality.
//!
//! This module defines the `Task` struct that represents a single to-do item with
//! its subtasks, due date, priority, category and attachments, together with the
//! authoring (`TaskDraft`) and editing (`TaskEdit`) inputs and their validation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fields::Priority;

/// Task identifier, derived from the creation timestamp in milliseconds.
pub type TaskId = String;

/// A named, independently completable item within a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(name: impl Into<String>) -> Self {
        Subtask {
            name: name.into(),
            completed: false,
        }
    }
}

/// Opaque file reference carried on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub uri: String,
}

/// A to-do item.
///
/// `progress` and `completed` are derived from `subtasks`; every mutation that
/// touches the subtasks goes through [`Task::refresh_progress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    pub category: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub progress: f64,
}

impl Task {
    /// Fraction of completed subtasks, 0.0 when the task has none.
    pub fn computed_progress(&self) -> f64 {
        progress_of(&self.subtasks)
    }

    /// Recompute `progress` and `completed` from the subtasks.
    pub fn refresh_progress(&mut self) {
        self.progress = self.computed_progress();
        self.completed = self.progress == 1.0;
    }

    /// Force the task and all of its subtasks complete.
    pub fn force_complete(&mut self) {
        for sub in self.subtasks.iter_mut() {
            sub.completed = true;
        }
        self.progress = 1.0;
        self.completed = true;
    }

    /// Rounded completion percentage for display.
    pub fn percentage(&self) -> u32 {
        (self.computed_progress() * 100.0).round() as u32
    }

    /// Check the fields every stored task must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("Task title cannot be empty."));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::validation("Task category cannot be empty."));
        }
        if self.subtasks.is_empty() {
            return Err(AppError::validation("Please add at least one subtask."));
        }
        if self.subtasks.iter().any(|s| s.name.trim().is_empty()) {
            return Err(AppError::validation("Subtask names cannot be empty."));
        }
        Ok(())
    }
}

/// Completed/total over a subtask list; an empty list yields 0.0.
pub fn progress_of(subtasks: &[Subtask]) -> f64 {
    if subtasks.is_empty() {
        return 0.0;
    }
    let done = subtasks.iter().filter(|s| s.completed).count();
    done as f64 / subtasks.len() as f64
}

/// Input collected by the authoring flow before a task is created.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub category: String,
    pub subtasks: Vec<String>,
    pub attachments: Vec<Attachment>,
}

impl TaskDraft {
    /// Validate the draft and build the task with the given id.
    ///
    /// Subtask names are trimmed and must be unique within the draft.
    pub fn into_task(self, id: TaskId) -> Result<Task> {
        let mut seen = HashSet::new();
        let mut subtasks = Vec::with_capacity(self.subtasks.len());
        for raw in &self.subtasks {
            let name = raw.trim();
            if name.is_empty() {
                return Err(AppError::validation("Subtask is empty."));
            }
            if !seen.insert(name.to_string()) {
                return Err(AppError::validation(format!("Subtask '{name}' already exists.")));
            }
            subtasks.push(Subtask::new(name));
        }

        let mut task = Task {
            id,
            title: self.title.trim().to_string(),
            due_date: self.due_date,
            priority: self.priority,
            category: self.category.trim().to_string(),
            subtasks,
            attachments: self.attachments,
            completed: false,
            progress: 0.0,
        };
        task.validate()?;
        task.refresh_progress();
        Ok(task)
    }
}

/// Field edits applied to an existing task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.category.is_none()
    }

    /// Apply the edits to a copy of `task`; the result must still validate.
    pub fn apply(&self, task: &Task) -> Result<Task> {
        let mut updated = task.clone();
        if let Some(title) = &self.title {
            updated.title = title.trim().to_string();
        }
        if let Some(due) = self.due_date {
            updated.due_date = due;
        }
        if let Some(priority) = self.priority {
            updated.priority = priority;
        }
        if let Some(category) = &self.category {
            updated.category = category.trim().to_string();
        }
        updated.validate()?;
        Ok(updated)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Build a task with the named subtasks; `done` marks which are complete.
    pub(crate) fn task_with(id: &str, subtasks: &[(&str, bool)]) -> Task {
        let mut task = Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            due_date: Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap(),
            priority: Priority::Medium,
            category: "Work".to_string(),
            subtasks: subtasks
                .iter()
                .map(|(name, done)| Subtask { name: name.to_string(), completed: *done })
                .collect(),
            attachments: Vec::new(),
            completed: false,
            progress: 0.0,
        };
        task.refresh_progress();
        task
    }

    fn draft(subtasks: &[&str]) -> TaskDraft {
        TaskDraft {
            title: "Buy milk".into(),
            due_date: Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap(),
            priority: Priority::High,
            category: "Errands".into(),
            subtasks: subtasks.iter().map(|s| s.to_string()).collect(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_progress_of_empty_is_zero() {
        assert_eq!(progress_of(&[]), 0.0);
        let mut task = task_with("1", &[]);
        task.refresh_progress();
        assert_eq!(task.progress, 0.0);
        assert!(!task.progress.is_nan());
        assert!(!task.completed);
    }

    #[test]
    fn test_refresh_progress_partial_and_full() {
        let task = task_with("1", &[("a", true), ("b", false), ("c", false), ("d", true)]);
        assert_eq!(task.progress, 0.5);
        assert!(!task.completed);
        assert_eq!(task.percentage(), 50);

        let task = task_with("2", &[("a", true), ("b", true)]);
        assert_eq!(task.progress, 1.0);
        assert!(task.completed);
    }

    #[test]
    fn test_force_complete_sets_all_subtasks() {
        let mut task = task_with("1", &[("a", false), ("b", true)]);
        task.force_complete();
        assert!(task.subtasks.iter().all(|s| s.completed));
        assert_eq!(task.progress, 1.0);
        assert!(task.completed);
    }

    #[test]
    fn test_draft_requires_subtasks() {
        let err = draft(&[]).into_task("1".into()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_draft_rejects_duplicate_and_blank_subtasks() {
        assert!(draft(&["a", " a "]).into_task("1".into()).is_err());
        assert!(draft(&["a", "   "]).into_task("1".into()).is_err());
    }

    #[test]
    fn test_draft_rejects_blank_title_and_category() {
        let mut d = draft(&["a"]);
        d.title = "  ".into();
        assert!(d.into_task("1".into()).is_err());

        let mut d = draft(&["a"]);
        d.category = "".into();
        assert!(d.into_task("1".into()).is_err());
    }

    #[test]
    fn test_draft_builds_incomplete_task() {
        let task = draft(&["a", "b"]).into_task("42".into()).unwrap();
        assert_eq!(task.id, "42");
        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(task.progress, 0.0);
        assert!(!task.completed);
    }

    #[test]
    fn test_edit_apply_validates_result() {
        let task = task_with("1", &[("a", false)]);
        let edit = TaskEdit { title: Some("   ".into()), ..Default::default() };
        assert!(edit.apply(&task).is_err());

        let edit = TaskEdit {
            priority: Some(Priority::Low),
            category: Some(" Home ".into()),
            ..Default::default()
        };
        let updated = edit.apply(&task).unwrap();
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.category, "Home");
        assert_eq!(updated.id, task.id);
    }

    #[test]
    fn test_legacy_task_deserialises_with_defaults() {
        let json = r#"{
            "id": "1700000000000",
            "title": "Legacy",
            "due_date": "2026-10-17T08:00:00Z",
            "category": "Work"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.subtasks.is_empty());
        assert_eq!(task.computed_progress(), 0.0);
    }
}
