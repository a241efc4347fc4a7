//! Task aggregation engine.
//!
//! Pure functions over a task list: subtask toggling with progress derivation,
//! sorting, filtering, title search, category discovery and the due-date
//! sections used by the list and calendar views. Nothing here holds state or
//! performs I/O; callers own the list and decide what to do with the result.
//!
//! Day comparisons happen in the time zone of the `now` (or `tz`) argument, so
//! the CLI passes `chrono::Local` and tests pass a fixed offset.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

use crate::fields::{CompletionFilter, SortKey, WeekStart};
use crate::task::Task;

/// View parameters for [`filter_tasks`]. Filters compose by logical AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Exact, case-sensitive category match. `None` or empty means any.
    pub category: Option<String>,
    pub completion: CompletionFilter,
}

/// The three due-date sections of the list view.
///
/// Tasks due before today belong to none of them; see [`overdue`].
#[derive(Debug, Clone, Default)]
pub struct DueBuckets {
    pub due_today: Vec<Task>,
    pub due_this_week: Vec<Task>,
    pub upcoming: Vec<Task>,
}

impl DueBuckets {
    pub fn len(&self) -> usize {
        self.due_today.len() + self.due_this_week.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flip one subtask and recompute that task's progress and completion.
///
/// Returns the list unchanged when `task_id` is unknown or `subtask_index` is
/// out of range.
pub fn toggle_subtask(tasks: &[Task], task_id: &str, subtask_index: usize) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id != task_id || subtask_index >= task.subtasks.len() {
                return task.clone();
            }
            let mut updated = task.clone();
            let sub = &mut updated.subtasks[subtask_index];
            sub.completed = !sub.completed;
            updated.refresh_progress();
            updated
        })
        .collect()
}

/// Stable reordering of the list by `key`.
pub fn sort_tasks(tasks: &[Task], key: SortKey) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    match key {
        SortKey::None => {}
        SortKey::Priority => sorted.sort_by_key(|t| t.priority.rank()),
        SortKey::DueDate => sorted.sort_by_key(|t| t.due_date),
        SortKey::Progress => {
            for task in sorted.iter_mut() {
                task.progress = task.computed_progress();
            }
            sorted.sort_by(|a, b| b.progress.partial_cmp(&a.progress).unwrap_or(Ordering::Equal));
        }
    }
    sorted
}

pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let category = filter.category.as_deref().filter(|c| !c.is_empty());
    tasks
        .iter()
        .filter(|t| category.map_or(true, |c| t.category == c))
        .filter(|t| filter.completion.matches(t.completed))
        .cloned()
        .collect()
}

/// Start and end day of the week containing `today`.
pub fn week_bounds(today: NaiveDate, week_start: WeekStart) -> (NaiveDate, NaiveDate) {
    let offset = match week_start {
        WeekStart::Sunday => today.weekday().num_days_from_sunday(),
        WeekStart::Monday => today.weekday().num_days_from_monday(),
    };
    let start = today - Duration::days(offset as i64);
    (start, start + Duration::days(6))
}

fn due_day<Tz: TimeZone>(task: &Task, tz: &Tz) -> NaiveDate {
    task.due_date.with_timezone(tz).date_naive()
}

/// Group tasks into today / this week / upcoming with a Sunday week start.
pub fn bucket_by_due_date<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> DueBuckets {
    bucket_by_due_date_with(tasks, now, WeekStart::Sunday)
}

/// Group tasks into today / this week / upcoming.
///
/// "This week" runs from the day after today through the last day of the
/// current week (inclusive). Overdue tasks are left out of all three.
pub fn bucket_by_due_date_with<Tz: TimeZone>(
    tasks: &[Task],
    now: &DateTime<Tz>,
    week_start: WeekStart,
) -> DueBuckets {
    let tz = now.timezone();
    let today = now.date_naive();
    let (_, week_end) = week_bounds(today, week_start);

    let mut buckets = DueBuckets::default();
    for task in tasks {
        let day = due_day(task, &tz);
        if day == today {
            buckets.due_today.push(task.clone());
        } else if day > today && day <= week_end {
            buckets.due_this_week.push(task.clone());
        } else if day > week_end {
            buckets.upcoming.push(task.clone());
        }
    }
    buckets
}

/// Tasks due on a calendar day before `now`'s day.
pub fn overdue<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Vec<Task> {
    let tz = now.timezone();
    let today = now.date_naive();
    tasks.iter().filter(|t| due_day(t, &tz) < today).cloned().collect()
}

/// Case-insensitive title substring search.
///
/// A blank query means "no filter active" and yields `None`, which is distinct
/// from `Some(vec![])` (a query with no matches).
pub fn search_by_title(tasks: &[Task], query: &str) -> Option<Vec<Task>> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    Some(
        tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .cloned()
            .collect(),
    )
}

/// Distinct categories present in the list.
pub fn compute_categories(tasks: &[Task]) -> BTreeSet<String> {
    tasks.iter().map(|t| t.category.clone()).collect()
}

/// Tasks whose due date falls on `date` in time zone `tz`.
pub fn tasks_on_date<Tz: TimeZone>(tasks: &[Task], date: NaiveDate, tz: &Tz) -> Vec<Task> {
    tasks.iter().filter(|t| due_day(t, tz) == date).cloned().collect()
}

/// Number of tasks due on each calendar day in time zone `tz`.
pub fn due_date_counts<Tz: TimeZone>(tasks: &[Task], tz: &Tz) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(due_day(task, tz)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::tests::task_with;
    use chrono::{FixedOffset, Utc};

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    /// Wednesday 2026-10-14, 10:00 at UTC-5.
    fn now() -> DateTime<FixedOffset> {
        offset().with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
    }

    fn due_at(id: &str, y: i32, m: u32, d: u32, h: u32) -> Task {
        let mut task = task_with(id, &[("a", false)]);
        task.due_date = offset().with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().with_timezone(&Utc);
        task
    }

    fn with_priority(id: &str, priority: Priority) -> Task {
        let mut task = task_with(id, &[("a", false)]);
        task.priority = priority;
        task
    }

    #[test]
    fn test_toggle_subtask_recomputes_progress() {
        let tasks = vec![
            task_with("1", &[("a", false), ("b", false)]),
            task_with("2", &[("x", false)]),
        ];
        let toggled = toggle_subtask(&tasks, "1", 1);
        assert!(toggled[0].subtasks[1].completed);
        assert_eq!(toggled[0].progress, 0.5);
        assert!(!toggled[0].completed);
        assert_eq!(toggled[1], tasks[1]);

        let toggled = toggle_subtask(&toggled, "1", 0);
        assert_eq!(toggled[0].progress, 1.0);
        assert!(toggled[0].completed);

        let toggled = toggle_subtask(&toggled, "1", 0);
        assert_eq!(toggled[0].progress, 0.5);
        assert!(!toggled[0].completed);
    }

    #[test]
    fn test_single_subtask_toggle_completes_task() {
        let tasks = vec![task_with("1", &[("a", false)])];
        let toggled = toggle_subtask(&tasks, "1", 0);
        assert_eq!(toggled[0].progress, 1.0);
        assert!(toggled[0].completed);
    }

    #[test]
    fn test_toggle_unknown_target_is_noop() {
        let tasks = vec![task_with("1", &[("a", false)])];
        assert_eq!(toggle_subtask(&tasks, "missing", 0), tasks);
        assert_eq!(toggle_subtask(&tasks, "1", 5), tasks);
    }

    #[test]
    fn test_sort_by_priority() {
        let tasks = vec![
            with_priority("1", Priority::Low),
            with_priority("2", Priority::High),
            with_priority("3", Priority::Medium),
        ];
        assert_eq!(ids(&sort_tasks(&tasks, SortKey::Priority)), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_sort_by_priority_is_stable() {
        let tasks = vec![
            with_priority("a", Priority::Medium),
            with_priority("b", Priority::High),
            with_priority("c", Priority::Medium),
            with_priority("d", Priority::High),
            with_priority("e", Priority::Medium),
        ];
        assert_eq!(ids(&sort_tasks(&tasks, SortKey::Priority)), vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let tasks = vec![
            due_at("1", 2026, 10, 20, 9),
            due_at("2", 2026, 10, 14, 9),
            due_at("3", 2026, 10, 20, 9),
            due_at("4", 2026, 10, 1, 9),
        ];
        for key in [SortKey::Priority, SortKey::DueDate, SortKey::Progress, SortKey::None] {
            let once = sort_tasks(&tasks, key);
            let twice = sort_tasks(&once, key);
            assert_eq!(ids(&once), ids(&twice));
        }
        assert_eq!(ids(&sort_tasks(&tasks, SortKey::DueDate)), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_sort_by_progress_uses_subtasks_not_cached_field() {
        let mut stale = task_with("stale", &[("a", true), ("b", true)]);
        stale.progress = 0.0;
        let tasks = vec![
            task_with("half", &[("a", true), ("b", false)]),
            task_with("empty", &[]),
            stale,
            task_with("none", &[("a", false)]),
        ];
        let sorted = sort_tasks(&tasks, SortKey::Progress);
        assert_eq!(ids(&sorted), vec!["stale", "half", "empty", "none"]);
        assert_eq!(sorted[0].progress, 1.0);
    }

    #[test]
    fn test_sort_none_preserves_order() {
        let tasks = vec![with_priority("1", Priority::Low), with_priority("2", Priority::High)];
        assert_eq!(ids(&sort_tasks(&tasks, SortKey::None)), vec!["1", "2"]);
    }

    #[test]
    fn test_filter_by_category_and_completion() {
        let mut home = task_with("1", &[("a", true)]);
        home.category = "Home".into();
        let mut home_open = task_with("2", &[("a", false)]);
        home_open.category = "Home".into();
        let work = task_with("3", &[("a", true)]);
        let tasks = vec![home, home_open, work];

        let filter = TaskFilter { category: Some("Home".into()), completion: CompletionFilter::All };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), vec!["1", "2"]);

        let filter = TaskFilter { category: Some("home".into()), completion: CompletionFilter::All };
        assert!(filter_tasks(&tasks, &filter).is_empty());

        let filter = TaskFilter { category: Some("Home".into()), completion: CompletionFilter::Completed };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), vec!["1"]);

        let filter = TaskFilter { category: Some(String::new()), completion: CompletionFilter::Incomplete };
        assert_eq!(ids(&filter_tasks(&tasks, &filter)), vec!["2"]);
    }

    #[test]
    fn test_filtered_categories_are_subset() {
        let mut a = task_with("1", &[("a", true)]);
        a.category = "Home".into();
        let b = task_with("2", &[("a", false)]);
        let tasks = vec![a, b];
        let all = compute_categories(&tasks);
        let filter = TaskFilter { category: None, completion: CompletionFilter::Completed };
        let subset = compute_categories(&filter_tasks(&tasks, &filter));
        assert!(subset.is_subset(&all));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_bucket_by_due_date_sunday_week() {
        let tasks = vec![
            due_at("today-late", 2026, 10, 14, 20),
            due_at("thu", 2026, 10, 15, 9),
            due_at("sat", 2026, 10, 17, 18),
            due_at("sun", 2026, 10, 18, 9),
            due_at("overdue", 2026, 10, 13, 9),
        ];
        let buckets = bucket_by_due_date(&tasks, &now());
        assert_eq!(ids(&buckets.due_today), vec!["today-late"]);
        assert_eq!(ids(&buckets.due_this_week), vec!["thu", "sat"]);
        assert_eq!(ids(&buckets.upcoming), vec!["sun"]);
        assert_eq!(buckets.len(), 4);
        assert_eq!(ids(&overdue(&tasks, &now())), vec!["overdue"]);
    }

    #[test]
    fn test_bucket_by_due_date_monday_week() {
        let tasks = vec![due_at("sun", 2026, 10, 18, 9), due_at("mon", 2026, 10, 19, 9)];
        let buckets = bucket_by_due_date_with(&tasks, &now(), WeekStart::Monday);
        assert_eq!(ids(&buckets.due_this_week), vec!["sun"]);
        assert_eq!(ids(&buckets.upcoming), vec!["mon"]);
    }

    #[test]
    fn test_buckets_are_disjoint_and_complete() {
        let mut tasks = Vec::new();
        for day in 1..=31 {
            tasks.push(due_at(&format!("d{day}"), 2026, 10, day, 12));
        }
        let buckets = bucket_by_due_date(&tasks, &now());
        let late = overdue(&tasks, &now());
        let mut seen: Vec<&str> = Vec::new();
        seen.extend(ids(&buckets.due_today));
        seen.extend(ids(&buckets.due_this_week));
        seen.extend(ids(&buckets.upcoming));
        seen.extend(ids(&late));
        let unique: BTreeSet<&str> = seen.iter().copied().collect();
        assert_eq!(seen.len(), unique.len());
        assert_eq!(seen.len(), tasks.len());
    }

    #[test]
    fn test_last_day_of_week_has_no_this_week_section() {
        let saturday = offset().with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap();
        let tasks = vec![due_at("sat", 2026, 10, 17, 9), due_at("sun", 2026, 10, 18, 9)];
        let buckets = bucket_by_due_date(&tasks, &saturday);
        assert_eq!(ids(&buckets.due_today), vec!["sat"]);
        assert!(buckets.due_this_week.is_empty());
        assert_eq!(ids(&buckets.upcoming), vec!["sun"]);
    }

    #[test]
    fn test_search_by_title() {
        let mut milk = task_with("1", &[("a", false)]);
        milk.title = "Buy milk".into();
        let mut bread = task_with("2", &[("milk", false)]);
        bread.title = "Bake bread".into();
        bread.category = "milk".into();
        let tasks = vec![milk, bread];

        assert!(search_by_title(&tasks, "").is_none());
        assert!(search_by_title(&tasks, "   ").is_none());
        assert_eq!(ids(&search_by_title(&tasks, "MILK").unwrap()), vec!["1"]);
        assert_eq!(search_by_title(&tasks, "cheese"), Some(Vec::new()));
    }

    #[test]
    fn test_calendar_views_use_given_time_zone() {
        let tasks = vec![due_at("1", 2026, 10, 14, 20), due_at("2", 2026, 10, 14, 8)];
        let local_day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(ids(&tasks_on_date(&tasks, local_day, &offset())), vec!["1", "2"]);

        let utc_counts = due_date_counts(&tasks, &Utc);
        assert_eq!(utc_counts.get(&local_day), Some(&1));
        assert_eq!(utc_counts.get(&NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()), Some(&1));
        assert_eq!(due_date_counts(&tasks, &offset()).get(&local_day), Some(&2));
    }

    #[test]
    fn test_week_bounds() {
        let wed = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let (start, end) = week_bounds(wed, WeekStart::Sunday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 10, 11).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        let (start, end) = week_bounds(wed, WeekStart::Monday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }
}
