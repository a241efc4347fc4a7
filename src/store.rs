//! Task store and due-date input helpers.
//!
//! `TaskStore` owns the task list for the lifetime of a command. Every mutation
//! validates first and only then touches the list, so a failed operation never
//! leaves a partially updated task behind. Derivations are delegated to
//! [`crate::engine`].

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine;
use crate::error::{AppError, Result};
use crate::fields::WeekStart;
use crate::task::{Attachment, Subtask, Task, TaskDraft, TaskEdit, TaskId};

/// In-memory task list, persisted as a single JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskStore {
    pub tasks: Vec<Task>,
}

impl TaskStore {
    /// Load the store from a JSON file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "task file missing, starting empty");
            return Ok(TaskStore::default());
        }
        let buf = fs::read_to_string(path)?;
        let mut store: TaskStore = serde_json::from_str(&buf).map_err(|e| {
            warn!(path = %path.display(), error = %e, "task file is not valid JSON");
            e
        })?;
        for task in store.tasks.iter_mut() {
            task.refresh_progress();
        }
        Ok(store)
    }

    /// Save the store to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "task file saved");
        Ok(())
    }

    /// Id for a task created at `now`: its millisecond timestamp, bumped past
    /// any id already in use.
    pub fn next_id(&self, now: DateTime<Utc>) -> TaskId {
        let mut millis = now.timestamp_millis();
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        millis.to_string()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id}")))
    }

    /// Apply `f` to a copy of the task and commit it only if it still validates.
    fn modify<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let idx = self.position(id)?;
        let mut updated = self.tasks[idx].clone();
        f(&mut updated)?;
        updated.validate()?;
        self.tasks[idx] = updated;
        Ok(())
    }

    /// Create a task from the authoring draft.
    pub fn add(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Result<TaskId> {
        let id = self.next_id(now);
        let task = draft.into_task(id.clone())?;
        debug!(id = %id, title = %task.title, "task added");
        self.tasks.push(task);
        Ok(id)
    }

    pub fn update(&mut self, id: &str, edit: &TaskEdit) -> Result<()> {
        let idx = self.position(id)?;
        let updated = edit.apply(&self.tasks[idx])?;
        self.tasks[idx] = updated;
        debug!(id, "task updated");
        Ok(())
    }

    /// Flip one subtask, reporting a missing task or index instead of ignoring it.
    pub fn toggle_subtask(&mut self, id: &str, index: usize) -> Result<()> {
        let task = self.get(id).ok_or_else(|| AppError::not_found(format!("task {id}")))?;
        if index >= task.subtasks.len() {
            return Err(AppError::not_found(format!("subtask {} of task {id}", index + 1)));
        }
        self.tasks = engine::toggle_subtask(&self.tasks, id, index);
        debug!(id, index, "subtask toggled");
        Ok(())
    }

    pub fn add_subtask(&mut self, id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Subtask is empty."));
        }
        self.modify(id, |task| {
            task.subtasks.push(Subtask::new(name));
            task.refresh_progress();
            Ok(())
        })
    }

    /// Remove a subtask; a task must keep at least one.
    pub fn remove_subtask(&mut self, id: &str, index: usize) -> Result<Subtask> {
        let mut removed = None;
        self.modify(id, |task| {
            if index >= task.subtasks.len() {
                return Err(AppError::not_found(format!("subtask {} of task {}", index + 1, task.id)));
            }
            removed = Some(task.subtasks.remove(index));
            task.refresh_progress();
            Ok(())
        })?;
        removed.ok_or_else(|| AppError::not_found(format!("subtask {} of task {id}", index + 1)))
    }

    pub fn add_attachment(&mut self, id: &str, attachment: Attachment) -> Result<()> {
        self.modify(id, |task| {
            task.attachments.push(attachment);
            Ok(())
        })
    }

    pub fn remove_attachment(&mut self, id: &str, index: usize) -> Result<Attachment> {
        let mut removed = None;
        self.modify(id, |task| {
            if index >= task.attachments.len() {
                return Err(AppError::not_found(format!("attachment {} of task {}", index + 1, task.id)));
            }
            removed = Some(task.attachments.remove(index));
            Ok(())
        })?;
        removed.ok_or_else(|| AppError::not_found(format!("attachment {} of task {id}", index + 1)))
    }

    fn check_ids(&self, ids: &[TaskId]) -> Result<HashSet<TaskId>> {
        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| self.get(id).is_none())
            .map(|id| id.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::not_found(format!("task(s) {}", missing.join(", "))));
        }
        Ok(ids.iter().cloned().collect())
    }

    /// Force every selected task and all of its subtasks complete.
    pub fn mark_complete(&mut self, ids: &[TaskId]) -> Result<usize> {
        let selected = self.check_ids(ids)?;
        for task in self.tasks.iter_mut().filter(|t| selected.contains(&t.id)) {
            task.force_complete();
        }
        debug!(count = selected.len(), "tasks marked complete");
        Ok(selected.len())
    }

    /// Delete the selected tasks. Unknown ids abort the whole deletion.
    pub fn delete(&mut self, ids: &[TaskId]) -> Result<usize> {
        let selected = self.check_ids(ids)?;
        self.tasks.retain(|t| !selected.contains(&t.id));
        debug!(count = selected.len(), "tasks deleted");
        Ok(selected.len())
    }

    /// Resolve a task identifier (either ID or title) to a task ID.
    /// Returns an error if the title has multiple matches and suggests using the ID instead.
    pub fn resolve(&self, identifier: &str) -> Result<TaskId> {
        if self.get(identifier).is_some() {
            return Ok(identifier.to_string());
        }

        let wanted = identifier.trim().to_lowercase();
        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.title.to_lowercase() == wanted)
            .collect();

        match matches.len() {
            0 => Err(AppError::not_found(format!("no task with ID or title '{identifier}'"))),
            1 => Ok(matches[0].id.clone()),
            _ => {
                let mut msg = format!("Multiple tasks are titled '{identifier}':\n");
                for task in matches {
                    msg.push_str(&format!("  ID {}: {} [{}]\n", task.id, task.title, task.category));
                }
                msg.push_str("Please use the specific ID instead.");
                Err(AppError::validation(msg))
            }
        }
    }
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekday names ("fri", "friday", "this friday", "next friday")
/// - "end of week" / "eow" (last day of the week under `week_start`)
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate, week_start: WeekStart) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => return Some(engine::week_bounds(today, week_start).1),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let offset = if let Some(n) = rest.strip_suffix('d') {
            n.trim().parse::<i64>().ok().and_then(Duration::try_days)
        } else if let Some(n) = rest.strip_suffix('w') {
            n.trim().parse::<i64>().ok().and_then(Duration::try_weeks)
        } else {
            None
        };
        // Out-of-range offsets are unrecognised input.
        return offset.and_then(|delta| today.checked_add_signed(delta));
    }

    let (next, day) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(s.as_str())),
    };
    if let Ok(target) = day.parse::<chrono::Weekday>() {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target.num_days_from_monday() as i64 + 7 - current) % 7;
        let ahead = if next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Timestamp for the start of `date` in time zone `tz`.
///
/// Falls back to local noon when midnight does not exist (DST gap).
pub fn due_from_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    [0, 12]
        .into_iter()
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
