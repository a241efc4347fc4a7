//! Command implementations for the CLI interface.
//!
//! Each handler loads what it needs from the [`Context`], calls into the store
//! or the aggregation engine, prints the result and saves on success. Errors
//! propagate to `main`, which reports them; nothing is saved after a failure.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use crossterm::{
    cursor, execute,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::config::{Config, SETTINGS_FILE, TASKS_FILE};
use crate::engine::{self, TaskFilter};
use crate::error::{AppError, Result};
use crate::fields::*;
use crate::format::*;
use crate::settings::{JsonFileSettings, Preferences};
use crate::store::{due_from_date, parse_due_input, TaskStore};
use crate::task::{Attachment, Task, TaskDraft, TaskEdit, TaskId};
use crate::timer::{Tick, Timer};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Subtask name. Repeat for several; at least one is required.
        #[arg(long = "subtask", short = 's')]
        subtasks: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "fri", "next mon", "in Nd", "eow".
        #[arg(long, default_value = "today")]
        due: String,
        /// Priority: high | medium | low. Defaults to the configured priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Category. New categories are created by using them.
        #[arg(long, short = 'c')]
        category: Option<String>,
        /// File to attach. May be repeated.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// List tasks in due-date sections, or sorted when a sort key is set.
    /// Flags are remembered for the next listing.
    List {
        /// Sort key: none | priority | due-date | progress.
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
        /// Only show this category (exact match).
        #[arg(long, conflicts_with = "all_categories")]
        category: Option<String>,
        /// Clear a remembered category filter.
        #[arg(long)]
        all_categories: bool,
        /// Completion filter: all | completed | incomplete.
        #[arg(long, value_enum)]
        show: Option<CompletionFilter>,
        /// Card detail: detailed | simplified.
        #[arg(long, value_enum)]
        view: Option<ViewMode>,
        /// Also show tasks due before today.
        #[arg(long)]
        overdue: bool,
        /// Render a compact table instead of cards.
        #[arg(long)]
        table: bool,
    },

    /// View a single task by ID or title.
    View {
        /// Task ID or title.
        id: String,
    },

    /// Edit fields on a task.
    Edit {
        /// Task ID or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Toggle a subtask's completion.
    Toggle {
        /// Task ID or title.
        id: String,
        /// Subtask number as shown by `view` (starting at 1).
        subtask: usize,
    },

    /// Add or remove subtasks.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Attach a file to a task.
    Attach {
        /// Task ID or title.
        id: String,
        path: PathBuf,
    },

    /// Remove an attachment from a task.
    Detach {
        /// Task ID or title.
        id: String,
        /// Attachment number as shown by `view` (starting at 1).
        index: usize,
    },

    /// Mark tasks complete, including all of their subtasks.
    Complete {
        /// Task IDs or titles.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete tasks.
    Delete {
        /// Task IDs or titles.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Search task titles (case-insensitive).
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Show a month calendar with due-date markers and the tasks due on a day.
    Calendar {
        /// Day to show: YYYY-MM-DD or any due-date expression. Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// List distinct categories.
    Categories,

    /// Expand or collapse a task in the simplified view.
    Expand {
        /// Task ID or title.
        id: String,
    },

    /// Show, set or toggle the colour theme.
    Theme {
        #[arg(value_enum)]
        theme: Option<Theme>,
        /// Switch between light and dark.
        #[arg(long, conflicts_with = "theme")]
        toggle: bool,
    },

    /// Run a countdown timer.
    Timer {
        #[arg(long, value_enum, default_value_t = TimerKind::Pomodoro)]
        kind: TimerKind,
        /// Length in minutes for the custom timer.
        #[arg(long)]
        minutes: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Append a subtask.
    Add {
        /// Task ID or title.
        id: String,
        name: String,
    },
    /// Remove a subtask. A task keeps at least one.
    Rm {
        /// Task ID or title.
        id: String,
        /// Subtask number (starting at 1).
        index: usize,
    },
}

/// Everything a command needs: configuration, tasks and preferences.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub store: TaskStore,
    pub settings: JsonFileSettings,
    pub prefs: Preferences,
}

impl Context {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        let config = Config::load(&data_dir)?;
        let store = TaskStore::load(&data_dir.join(TASKS_FILE))?;
        let settings = JsonFileSettings::open(&data_dir.join(SETTINGS_FILE));
        let prefs = Preferences::load(&settings);
        debug!(dir = %data_dir.display(), tasks = store.tasks.len(), "context opened");
        Ok(Context {
            data_dir,
            config,
            store,
            settings,
            prefs,
        })
    }

    fn save_tasks(&self) -> Result<()> {
        self.store.save(&self.data_dir.join(TASKS_FILE))
    }

    /// Persist preferences. Failures only cost the remembered view state.
    fn save_prefs(&mut self) {
        if let Err(e) = self.prefs.save(&mut self.settings) {
            warn!(error = %e, "preferences not saved");
        }
    }

    fn palette(&self) -> Palette {
        Palette::for_theme(self.prefs.theme)
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn parse_date(&self, input: &str) -> Result<NaiveDate> {
        parse_due_input(input, self.today(), self.config.week_start)
            .ok_or_else(|| AppError::invalid_input(format!("unrecognised date '{input}'")))
    }

    fn parse_due(&self, input: &str) -> Result<chrono::DateTime<Utc>> {
        let date = self.parse_date(input)?;
        due_from_date(date, &Local)
            .ok_or_else(|| AppError::invalid_input(format!("no local time exists on {date}")))
    }

    fn resolve_all(&self, identifiers: &[String]) -> Result<Vec<TaskId>> {
        identifiers.iter().map(|i| self.store.resolve(i)).collect()
    }
}

/// Run a command that needs the data directory.
pub fn run(command: Commands, data_dir: PathBuf) -> Result<()> {
    let mut ctx = Context::open(data_dir)?;
    match command {
        Commands::Add { title, subtasks, due, priority, category, attachments } => {
            cmd_add(&mut ctx, title, subtasks, due, priority, category, attachments)
        }
        Commands::List { sort, category, all_categories, show, view, overdue, table } => {
            cmd_list(&mut ctx, sort, category, all_categories, show, view, overdue, table)
        }
        Commands::View { id } => cmd_view(&ctx, &id),
        Commands::Edit { id, title, due, priority, category } => {
            cmd_edit(&mut ctx, &id, title, due, priority, category)
        }
        Commands::Toggle { id, subtask } => cmd_toggle(&mut ctx, &id, subtask),
        Commands::Subtask { action } => cmd_subtask(&mut ctx, action),
        Commands::Attach { id, path } => cmd_attach(&mut ctx, &id, &path),
        Commands::Detach { id, index } => cmd_detach(&mut ctx, &id, index),
        Commands::Complete { ids } => cmd_complete(&mut ctx, &ids),
        Commands::Delete { ids } => cmd_delete(&mut ctx, &ids),
        Commands::Search { query } => cmd_search(&ctx, &query),
        Commands::Calendar { date } => cmd_calendar(&ctx, date),
        Commands::Categories => cmd_categories(&ctx),
        Commands::Expand { id } => cmd_expand(&mut ctx, &id),
        Commands::Theme { theme, toggle } => cmd_theme(&mut ctx, theme, toggle),
        Commands::Timer { kind, minutes } => cmd_timer(&ctx.config, kind, minutes),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// 1-based user index to 0-based position.
fn zero_based(index: usize, what: &str) -> Result<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| AppError::invalid_input(format!("{what} numbers start at 1")))
}

/// Describe a file on disk as an attachment.
fn attachment_for(path: &Path) -> Result<Attachment> {
    let canonical = path.canonicalize().map_err(|e| {
        warn!(path = %path.display(), error = %e, "attachment unavailable");
        e
    })?;
    let name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| canonical.display().to_string());
    Ok(Attachment {
        name,
        uri: format!("file://{}", canonical.display()),
    })
}

/// Add a new task to the store.
pub fn cmd_add(
    ctx: &mut Context,
    title: String,
    subtasks: Vec<String>,
    due: String,
    priority: Option<Priority>,
    category: Option<String>,
    attachments: Vec<PathBuf>,
) -> Result<()> {
    let due_date = ctx.parse_due(&due)?;
    let attachments = attachments
        .iter()
        .map(|p| attachment_for(p))
        .collect::<Result<Vec<_>>>()?;
    let draft = TaskDraft {
        title,
        due_date,
        priority: priority.unwrap_or(ctx.config.default_priority),
        category: category.unwrap_or_else(|| ctx.config.default_category.clone()),
        subtasks,
        attachments,
    };
    let id = ctx.store.add(draft, Utc::now())?;
    ctx.save_tasks()?;
    println!("Added task {id}");
    Ok(())
}

/// List tasks with the remembered (or given) sort and filters.
#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    ctx: &mut Context,
    sort: Option<SortKey>,
    category: Option<String>,
    all_categories: bool,
    show: Option<CompletionFilter>,
    view: Option<ViewMode>,
    overdue: bool,
    table: bool,
) -> Result<()> {
    let before = ctx.prefs.clone();
    if let Some(sort) = sort {
        ctx.prefs.sort = sort;
    }
    if let Some(category) = category {
        ctx.prefs.filter_category = Some(category).filter(|c| !c.is_empty());
    }
    if all_categories {
        ctx.prefs.filter_category = None;
    }
    if let Some(show) = show {
        ctx.prefs.completion = show;
    }
    if let Some(view) = view {
        ctx.prefs.view_mode = view;
    }
    ctx.prefs
        .retain_expanded(ctx.store.tasks.iter().map(|t| t.id.as_str()));
    if ctx.prefs != before {
        ctx.save_prefs();
    }

    let palette = ctx.palette();
    let today = ctx.today();
    let prefs = &ctx.prefs;

    println!(
        "Showing: {} - {} - {}",
        prefs.completion.label(),
        prefs.sort.label(),
        prefs.filter_category.as_deref().unwrap_or("All Categories")
    );
    println!();

    if ctx.store.tasks.is_empty() {
        println!("No tasks yet. Add one!");
        return Ok(());
    }

    let filter = TaskFilter {
        category: prefs.filter_category.clone(),
        completion: prefs.completion,
    };
    let filtered = engine::filter_tasks(&ctx.store.tasks, &filter);
    let show_tasks = |tasks: &[Task]| {
        if table {
            print_table(tasks, today, &palette);
        } else {
            for task in tasks {
                let expanded = prefs.view_mode == ViewMode::Detailed || prefs.is_expanded(&task.id);
                print_task_card(task, expanded, today, &palette);
                println!();
            }
        }
    };

    if prefs.sort != SortKey::None {
        let sorted = engine::sort_tasks(&filtered, prefs.sort);
        if sorted.is_empty() {
            println!("No tasks match the current filters.");
        }
        show_tasks(&sorted);
        return Ok(());
    }

    let now = Local::now();
    let buckets = engine::bucket_by_due_date_with(&filtered, &now, ctx.config.week_start);
    let mut sections = vec![
        ("Due Today", buckets.due_today),
        ("This Week", buckets.due_this_week),
        ("Upcoming", buckets.upcoming),
    ];
    if overdue {
        sections.push(("Overdue", engine::overdue(&filtered, &now)));
    }
    for (title, tasks) in sections {
        print_heading(title, &palette);
        if tasks.is_empty() {
            println!("{}", "No tasks in this category.".with(palette.muted));
            println!();
        } else {
            show_tasks(&tasks);
        }
    }
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view(ctx: &Context, identifier: &str) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    let task = ctx
        .store
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("task {id}")))?;
    print_task_card(task, true, ctx.today(), &ctx.palette());
    Ok(())
}

/// Update an existing task's fields.
pub fn cmd_edit(
    ctx: &mut Context,
    identifier: &str,
    title: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
    category: Option<String>,
) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    let due_date = due.as_deref().map(|d| ctx.parse_due(d)).transpose()?;
    let edit = TaskEdit {
        title,
        due_date,
        priority,
        category,
    };
    if edit.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    ctx.store.update(&id, &edit)?;
    ctx.save_tasks()?;
    println!("Updated task {id}");
    Ok(())
}

/// Toggle one subtask and keep its task expanded.
pub fn cmd_toggle(ctx: &mut Context, identifier: &str, subtask: usize) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    ctx.store.toggle_subtask(&id, zero_based(subtask, "subtask")?)?;
    ctx.save_tasks()?;
    ctx.prefs.expanded.insert(id.clone(), true);
    ctx.save_prefs();

    if let Some(task) = ctx.store.get(&id) {
        let palette = ctx.palette();
        let sub = &task.subtasks[subtask - 1];
        let state = if sub.completed { "done" } else { "not done" };
        println!("{}: '{}' marked {}", task.title, sub.name, state);
        println!(
            "{} {}%{}",
            progress_bar(task.progress, 20).with(palette.accent),
            task.percentage(),
            if task.completed { "  ✔ Completed" } else { "" }
        );
    }
    Ok(())
}

pub fn cmd_subtask(ctx: &mut Context, action: SubtaskAction) -> Result<()> {
    match action {
        SubtaskAction::Add { id, name } => {
            let id = ctx.store.resolve(&id)?;
            ctx.store.add_subtask(&id, &name)?;
            ctx.save_tasks()?;
            println!("Added subtask to task {id}");
        }
        SubtaskAction::Rm { id, index } => {
            let id = ctx.store.resolve(&id)?;
            let removed = ctx.store.remove_subtask(&id, zero_based(index, "subtask")?)?;
            ctx.save_tasks()?;
            println!("Removed subtask '{}' from task {id}", removed.name);
        }
    }
    Ok(())
}

pub fn cmd_attach(ctx: &mut Context, identifier: &str, path: &Path) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    let attachment = attachment_for(path)?;
    let name = attachment.name.clone();
    ctx.store.add_attachment(&id, attachment)?;
    ctx.save_tasks()?;
    println!("Attached {name} to task {id}");
    Ok(())
}

pub fn cmd_detach(ctx: &mut Context, identifier: &str, index: usize) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    let removed = ctx.store.remove_attachment(&id, zero_based(index, "attachment")?)?;
    ctx.save_tasks()?;
    println!("Removed {} from task {id}", removed.name);
    Ok(())
}

/// Mark the selected tasks complete.
pub fn cmd_complete(ctx: &mut Context, identifiers: &[String]) -> Result<()> {
    let ids = ctx.resolve_all(identifiers)?;
    let count = ctx.store.mark_complete(&ids)?;
    ctx.save_tasks()?;
    println!("Marked {count} task(s) complete");
    Ok(())
}

/// Delete the selected tasks and forget their expanded state.
pub fn cmd_delete(ctx: &mut Context, identifiers: &[String]) -> Result<()> {
    let ids = ctx.resolve_all(identifiers)?;
    let count = ctx.store.delete(&ids)?;
    ctx.save_tasks()?;
    let before = ctx.prefs.expanded.len();
    for id in &ids {
        ctx.prefs.expanded.remove(id);
    }
    if ctx.prefs.expanded.len() != before {
        ctx.save_prefs();
    }
    println!("Deleted {count} task(s)");
    Ok(())
}

/// Search by title. A blank query lists nothing.
pub fn cmd_search(ctx: &Context, query: &str) -> Result<()> {
    let palette = ctx.palette();
    match engine::search_by_title(&ctx.store.tasks, query) {
        None => println!("Enter a search query to find tasks by title."),
        Some(found) if found.is_empty() => println!("No tasks found."),
        Some(found) => {
            let today = ctx.today();
            for task in &found {
                print_task_card(task, true, today, &palette);
                println!();
            }
        }
    }
    Ok(())
}

fn days_in_month(first: NaiveDate) -> u32 {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .map(|next| (next - Duration::days(1)).day())
        .unwrap_or(28)
}

/// Month grid with a marker on days that have tasks due, plus the selected day's tasks.
pub fn cmd_calendar(ctx: &Context, date: Option<String>) -> Result<()> {
    let selected = match date {
        Some(d) => ctx.parse_date(&d)?,
        None => ctx.today(),
    };
    let palette = ctx.palette();
    let counts = engine::due_date_counts(&ctx.store.tasks, &Local);

    let first = selected.with_day(1).unwrap_or(selected);
    print_heading(&first.format("%B %Y").to_string(), &palette);

    let names = match ctx.config.week_start {
        WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
        WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
    };
    println!(" {}", names.map(|n| format!("{n:>3}")).join(" "));

    let lead = match ctx.config.week_start {
        WeekStart::Sunday => first.weekday().num_days_from_sunday(),
        WeekStart::Monday => first.weekday().num_days_from_monday(),
    } as usize;
    let mut line = " ".to_string() + &"    ".repeat(lead);
    let mut column = lead;
    for day in 1..=days_in_month(first) {
        let date = first.with_day(day).unwrap_or(first);
        let marker = if counts.contains_key(&date) { "*" } else { " " };
        let cell = format!("{day:>2}{marker}");
        if date == selected {
            line.push_str(&format!("{}", cell.with(palette.accent).bold().reverse()));
        } else if marker == "*" {
            line.push_str(&format!("{}", cell.with(palette.heading)));
        } else {
            line.push_str(&cell);
        }
        column += 1;
        if column % 7 == 0 {
            println!("{}", line.trim_end());
            line = " ".to_string();
        } else {
            line.push(' ');
        }
    }
    if !line.trim().is_empty() {
        println!("{}", line.trim_end());
    }
    println!();

    let tasks = engine::tasks_on_date(&ctx.store.tasks, selected, &Local);
    print_heading(&format!("Tasks for {selected}"), &palette);
    if tasks.is_empty() {
        println!("No tasks for this date.");
    }
    let today = ctx.today();
    for task in &tasks {
        print_task_card(task, true, today, &palette);
        println!();
    }
    Ok(())
}

/// List distinct categories.
pub fn cmd_categories(ctx: &Context) -> Result<()> {
    let categories = engine::compute_categories(&ctx.store.tasks);
    if categories.is_empty() {
        println!("No categories yet.");
    }
    for category in categories {
        let count = ctx.store.tasks.iter().filter(|t| t.category == category).count();
        println!("{category} ({count})");
    }
    Ok(())
}

pub fn cmd_expand(ctx: &mut Context, identifier: &str) -> Result<()> {
    let id = ctx.store.resolve(identifier)?;
    let expanded = ctx.prefs.toggle_expanded(&id);
    ctx.save_prefs();
    println!("Task {id} {}", if expanded { "expanded" } else { "collapsed" });
    Ok(())
}

pub fn cmd_theme(ctx: &mut Context, theme: Option<Theme>, toggle: bool) -> Result<()> {
    let next = match (theme, toggle) {
        (Some(theme), _) => theme,
        (None, true) => ctx.prefs.theme.toggled(),
        (None, false) => {
            println!("Theme: {}", ctx.prefs.theme.code());
            return Ok(());
        }
    };
    ctx.prefs.theme = next;
    ctx.save_prefs();
    println!("Theme: {}", next.code());
    Ok(())
}

/// Run the countdown in place, one tick per second, until it expires.
pub fn cmd_timer(config: &Config, kind: TimerKind, minutes: Option<String>) -> Result<()> {
    let mut timer = Timer::new(config.timer.clone());
    if let Some(minutes) = minutes.as_deref() {
        timer.set_custom_minutes(minutes)?;
    } else if kind == TimerKind::Custom {
        return Err(AppError::invalid_input("--minutes is required for a custom timer"));
    }
    timer.change_kind(kind);
    timer.start();

    let mut stdout = io::stdout();
    let draw = |out: &mut io::Stdout, timer: &Timer| -> io::Result<()> {
        let line = format!(
            "{} {} {}",
            kind.label(),
            timer.display(),
            progress_bar(timer.remaining_fraction(), 30)
        );
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))
    };

    draw(&mut stdout, &timer)?;
    loop {
        thread::sleep(StdDuration::from_secs(1));
        match timer.tick() {
            Tick::Running { .. } => draw(&mut stdout, &timer)?,
            Tick::Expired => {
                draw(&mut stdout, &timer)?;
                writeln!(stdout)?;
                writeln!(stdout, "\x07Time is up! Your {} session has ended.", kind.label())?;
                return Ok(());
            }
            Tick::Idle => return Ok(()),
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tide", &mut io::stdout());
}
