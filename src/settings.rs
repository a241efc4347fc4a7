//! Key-value preference storage.
//!
//! Display preferences (sort key, filters, view mode, expanded tasks, theme) are
//! kept apart from the task list behind the small [`SettingsStore`] interface.
//! Values are plain strings; `expandedTasks` holds a JSON-encoded map.
//!
//! Preferences are best effort: a failed read or an unknown value is logged and
//! replaced by the default, and never affects the task list.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::fields::{CompletionFilter, SortKey, Theme, ViewMode};

pub const SORT_OPTION: &str = "sortOption";
pub const FILTER_CATEGORY: &str = "filterCategory";
pub const TASK_FILTER: &str = "taskFilter";
pub const VIEW_MODE: &str = "viewMode";
pub const EXPANDED_TASKS: &str = "expandedTasks";
pub const THEME: &str = "theme";

/// A string-keyed, string-valued preference store.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Preferences kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileSettings {
    /// Open the settings file. A missing or unreadable file starts empty.
    pub fn open(path: &Path) -> Self {
        let values = match fs::read_to_string(path) {
            Ok(buf) => serde_json::from_str(&buf).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "settings file unreadable, using defaults");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read settings");
                BTreeMap::new()
            }
        };
        JsonFileSettings {
            path: path.to_path_buf(),
            values,
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(serde_json::to_string_pretty(&self.values)?.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Typed view over the preference keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub sort: SortKey,
    /// `None` shows every category.
    pub filter_category: Option<String>,
    pub completion: CompletionFilter,
    pub view_mode: ViewMode,
    /// Task id -> expanded flag, honoured by the simplified view.
    pub expanded: BTreeMap<String, bool>,
    pub theme: Theme,
}

fn read_key(store: &dyn SettingsStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "failed to read preference");
            None
        }
    }
}

fn decode<T>(key: &str, raw: Option<String>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!(key, value = %raw, "ignoring unknown preference value");
    }
    parsed
}

impl Preferences {
    pub fn load(store: &dyn SettingsStore) -> Self {
        let expanded = read_key(store, EXPANDED_TASKS)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!(error = %e, "ignoring malformed expandedTasks");
                    None
                }
            })
            .unwrap_or_default();

        Preferences {
            sort: decode(SORT_OPTION, read_key(store, SORT_OPTION), SortKey::from_code).unwrap_or_default(),
            filter_category: read_key(store, FILTER_CATEGORY).filter(|c| !c.is_empty()),
            completion: decode(TASK_FILTER, read_key(store, TASK_FILTER), CompletionFilter::from_code)
                .unwrap_or_default(),
            view_mode: decode(VIEW_MODE, read_key(store, VIEW_MODE), ViewMode::from_code).unwrap_or_default(),
            expanded,
            theme: decode(THEME, read_key(store, THEME), Theme::from_code).unwrap_or_default(),
        }
    }

    /// Write every key. Failures are logged and reported to the caller.
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<()> {
        let result = (|| -> Result<()> {
            store.set(SORT_OPTION, self.sort.code())?;
            store.set(FILTER_CATEGORY, self.filter_category.as_deref().unwrap_or(""))?;
            store.set(TASK_FILTER, self.completion.code())?;
            store.set(VIEW_MODE, self.view_mode.code())?;
            store.set(EXPANDED_TASKS, &serde_json::to_string(&self.expanded)?)?;
            store.set(THEME, self.theme.code())
        })();
        match &result {
            Ok(()) => debug!("preferences saved"),
            Err(e) => warn!(error = %e, "failed to save preferences"),
        }
        result
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    /// Flip the expanded flag of a task and return the new state.
    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        let flag = !self.is_expanded(id);
        self.expanded.insert(id.to_string(), flag);
        flag
    }

    /// Drop expansion entries for tasks that no longer exist.
    pub fn retain_expanded<'a>(&mut self, live_ids: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live_ids.into_iter().collect();
        self.expanded.retain(|id, _| live.contains(id.as_str()));
    }
}
