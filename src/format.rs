//! Terminal rendering helpers.
//!
//! Task rows, detail cards, progress bars and relative due dates, coloured
//! according to the active [`Theme`].

use chrono::{Local, NaiveDate};
use crossterm::style::{Color, Stylize};

use crate::fields::{Priority, Theme};
use crate::task::Task;

/// Colours for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub heading: Color,
    pub text: Color,
    pub done: Color,
    pub muted: Color,
    pub accent: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                heading: Color::Rgb { r: 0, g: 123, b: 255 },
                text: Color::Black,
                done: Color::Rgb { r: 40, g: 167, b: 69 },
                muted: Color::Grey,
                accent: Color::Rgb { r: 255, g: 140, b: 0 },
            },
            Theme::Dark => Palette {
                heading: Color::Rgb { r: 102, g: 178, b: 255 },
                text: Color::White,
                done: Color::Rgb { r: 102, g: 187, b: 106 },
                muted: Color::DarkGrey,
                accent: Color::Rgb { r: 255, g: 183, b: 77 },
            },
        }
    }
}

/// Calendar day of a task's due date in the local time zone.
pub fn local_due_day(task: &Task) -> NaiveDate {
    task.due_date.with_timezone(&Local).date_naive()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Fixed-width text progress bar, e.g. `[#####-----]`.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

pub fn print_heading(title: &str, palette: &Palette) {
    println!("{}", title.with(palette.heading).bold());
    println!("{}", "-".repeat(title.chars().count()).with(palette.muted));
}

/// Print tasks as a compact table.
pub fn print_table(tasks: &[Task], today: NaiveDate, palette: &Palette) {
    println!(
        "{:<14} {:<7} {:<10} {:<6} {:<12} {}",
        "ID", "Pri", "Due", "Done", "Category", "Title"
    );
    for t in tasks {
        let row = format!(
            "{:<14} {:<7} {:<10} {:>4}%  {:<12} {}",
            t.id,
            format_priority(t.priority),
            format_due_relative(local_due_day(t), today),
            t.percentage(),
            truncate(&t.category, 12),
            t.title
        );
        if t.completed {
            println!("{}", row.with(palette.done));
        } else {
            println!("{}", row.with(palette.text));
        }
    }
}

/// Print one task as a card. `expanded` adds details and subtasks.
pub fn print_task_card(task: &Task, expanded: bool, today: NaiveDate, palette: &Palette) {
    let title = format!("{}  (#{})", task.title, task.id);
    if task.completed {
        println!("{}", title.with(palette.done).bold());
    } else {
        println!("{}", title.with(palette.text).bold());
    }
    if !expanded {
        return;
    }

    let due = local_due_day(task);
    println!("  Due Date: {} ({})", due, format_due_relative(due, today));
    println!("  Priority: {}", format_priority(task.priority));
    println!("  Category: {}", task.category);
    if task.completed {
        println!("  {}", "✔ Completed".with(palette.done).bold());
    }
    println!(
        "  {} {}%",
        progress_bar(task.computed_progress(), 20).with(palette.accent),
        task.percentage()
    );
    for (i, sub) in task.subtasks.iter().enumerate() {
        let mark = if sub.completed { "✔" } else { "✗" };
        let line = format!("    {}. {} {}", i + 1, mark, sub.name);
        if sub.completed {
            println!("{}", line.with(palette.done));
        } else {
            println!("{}", line.with(palette.text));
        }
    }
    if !task.attachments.is_empty() {
        println!("  Attachments:");
        for (i, file) in task.attachments.iter().enumerate() {
            println!("    {}. {} {}", i + 1, file.name, file.uri.as_str().with(palette.muted));
        }
    }
}
