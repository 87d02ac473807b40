use crate::ui;
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use daybook::calendar::{CalendarCell, Month};
use daybook::config::Config;
use daybook::model::{format_created, Rank, Task};
use daybook::session::{SessionError, Submitted, Tracker};
use daybook::storage::{init_project_store, locate_store, FileStore};
use std::env;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_store(&cwd).context("initializing task file")?;
    println!("Initialized task file at {}", location.path.display());
    Ok(())
}

pub fn list(config: &Config) -> Result<()> {
    let tracker = load_tracker(config)?;
    let location = tracker.store().location();
    println!(
        "Tasks ({}, {})",
        location.scope.label(),
        location.path.display()
    );
    let sorted = tracker.sorted();
    if sorted.is_empty() {
        println!("  (empty)");
    }
    for (idx, task) in sorted.into_iter().enumerate() {
        print_task(idx + 1, task);
    }
    Ok(())
}

pub fn add(config: &Config, text: String, tag: String, rank: i64) -> Result<()> {
    let rank = Rank::new(rank)?;
    let mut tracker = load_tracker(config)?;
    let session = tracker.session_mut();
    session.set_text(text);
    session.set_tag(tag);
    session.set_rank(rank);
    report_submit(tracker.submit())
}

pub fn edit(
    config: &Config,
    task_id: String,
    text: Option<String>,
    tag: Option<String>,
    rank: Option<i64>,
) -> Result<()> {
    let rank = rank.map(Rank::new).transpose()?;
    let mut tracker = load_tracker(config)?;
    tracker
        .begin_edit(&task_id)
        .with_context(|| format!("editing task {}", task_id))?;
    let session = tracker.session_mut();
    if let Some(t) = text {
        session.set_text(t);
    }
    if let Some(t) = tag {
        session.set_tag(t);
    }
    if let Some(r) = rank {
        session.set_rank(r);
    }
    report_submit(tracker.submit())
}

pub fn delete(config: &Config, task_id: String) -> Result<()> {
    let mut tracker = load_tracker(config)?;
    tracker
        .delete(&task_id)
        .with_context(|| format!("deleting task {}", task_id))?;
    println!("Deleted task {}", task_id);
    Ok(())
}

pub fn summary(config: &Config) -> Result<()> {
    let tracker = load_tracker(config)?;
    let summary = tracker.summary(Local::now().naive_local());
    println!("Past   {:>4}", summary.past);
    println!("Today  {:>4}", summary.today);
    println!();
    println!("My Projects");
    if summary.by_tag.is_empty() {
        println!("  (no tasks)");
    }
    for (tag, count) in &summary.by_tag {
        println!("  # {:<16} {:>4}", tag, count);
    }
    Ok(())
}

pub fn calendar(config: &Config, month: Option<String>, day: Option<String>) -> Result<()> {
    let mut tracker = load_tracker(config)?;
    if let Some(raw) = month {
        tracker.calendar_mut().month = raw.parse::<Month>()?;
    }
    if let Some(raw) = day {
        tracker.calendar_mut().select(parse_day(&raw)?);
    }

    let grid = tracker.grid();
    println!("{:^35}", grid.month.to_string());
    println!(
        "{}",
        ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .iter()
            .map(|d| format!("{:^5}", d))
            .collect::<String>()
    );
    for week in grid.weeks(tracker.tasks()) {
        println!("{}", week.iter().map(format_cell).collect::<String>());
    }

    if let Some(date) = tracker.calendar().selected {
        println!();
        println!("Tasks for {}", date.format("%d %B %Y"));
        let tasks = tracker.selected_tasks();
        if tasks.is_empty() {
            println!("  No tasks for this date.");
        }
        for task in tasks {
            println!("  - {} (#{}, rank {})", task.text, task.tag, task.rank);
        }
    }
    Ok(())
}

pub fn tui(config: &Config) -> Result<()> {
    let tracker = load_tracker(config)?;
    ui::run(tracker, config.tags.clone())
}

fn load_tracker(config: &Config) -> Result<Tracker<FileStore>> {
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd, config.store.as_deref()).context("locating task file")?;
    tracing::debug!(path = %location.path.display(), scope = location.scope.label(), "using task file");
    let month = Month::containing(Local::now().date_naive());
    let mut tracker = Tracker::new(FileStore::new(location), month);
    tracker.refresh().context("loading tasks")?;
    Ok(tracker)
}

fn report_submit(result: Result<Submitted, SessionError>) -> Result<()> {
    match result {
        Ok(Submitted::Created) => println!("Added task"),
        Ok(Submitted::Updated) => println!("Updated task"),
        // Empty text is refused without contacting the store.
        Err(SessionError::Validation) => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
}

fn format_cell(cell: &CalendarCell) -> String {
    let day = cell.date.format("%-d").to_string();
    let text = match (cell.in_current_month, cell.has_task) {
        (true, true) => format!("{}*", day),
        (true, false) => day,
        (false, _) => format!("({})", day),
    };
    format!("{:>4} ", text)
}

fn print_task(position: usize, task: &Task) {
    let (date, time) = format_created(&task.created_at);
    println!("{:>3}. {}: {}", position, task.id, task.text);
    println!(
        "     #{}  priority {}  date {}  time {}",
        task.tag, task.rank, date, time
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selected_day() {
        assert_eq!(
            parse_day(" 2024-03-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_day("15/03/2024").is_err());
    }

    #[test]
    fn formats_cells_by_classification() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let cell = |in_current_month, has_task| CalendarCell {
            date,
            in_current_month,
            has_task,
        };
        assert_eq!(format_cell(&cell(true, true)), "  5* ");
        assert_eq!(format_cell(&cell(true, false)), "   5 ");
        assert_eq!(format_cell(&cell(false, true)), " (5) ");
    }
}
