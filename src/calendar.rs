//! Month grid generation for the calendar view.
//!
//! Weeks start on Sunday. A grid always covers whole weeks, so cells from
//! the neighbouring months are included and flagged as out of month.

use crate::model::Task;
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MonthError {
    #[error("month out of range: {0}")]
    OutOfRange(u32),
    #[error("invalid month (use YYYY-MM): {0}")]
    Parse(String),
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(MonthError::OutOfRange(month));
        }
        Ok(Month { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Construction guarantees the first of the month exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Month {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Month {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for Month {
    type Err = MonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (year, month) = raw
            .split_once('-')
            .ok_or_else(|| MonthError::Parse(raw.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthError::Parse(raw.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthError::Parse(raw.to_string()))?;
        Month::new(year, month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day().format("%B %Y"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub has_task: bool,
}

/// Visible date range for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub month: Month,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub grid_start: NaiveDate,
    pub grid_end: NaiveDate,
}

impl MonthGrid {
    pub fn new(month: Month) -> Self {
        let month_start = month.first_day();
        let month_end = month.last_day();
        let lead = month_start.weekday().num_days_from_sunday() as i64;
        let trail = 6 - month_end.weekday().num_days_from_sunday() as i64;
        MonthGrid {
            month,
            month_start,
            month_end,
            grid_start: month_start - Duration::days(lead),
            grid_end: month_end + Duration::days(trail),
        }
    }

    /// Every day from `grid_start` to `grid_end` inclusive. Each call starts
    /// over from `grid_start`.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.grid_end;
        self.grid_start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn cells(&self, tasks: &[Task]) -> Vec<CalendarCell> {
        let task_days = tasks
            .iter()
            .filter_map(Task::created_on)
            .collect::<std::collections::HashSet<_>>();
        self.dates()
            .map(|date| CalendarCell {
                date,
                in_current_month: self.month.contains(date),
                has_task: task_days.contains(&date),
            })
            .collect()
    }

    pub fn weeks(&self, tasks: &[Task]) -> Vec<Vec<CalendarCell>> {
        self.cells(tasks)
            .chunks(7)
            .map(|week| week.to_vec())
            .collect()
    }
}

pub fn has_task(date: NaiveDate, tasks: &[Task]) -> bool {
    tasks.iter().any(|task| task.created_on() == Some(date))
}

pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.created_on() == Some(date))
        .collect()
}

/// Month currently shown plus the selected day. The selection survives
/// month navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    pub month: Month,
    pub selected: Option<NaiveDate>,
}

impl CalendarState {
    pub fn new(month: Month) -> Self {
        CalendarState {
            month,
            selected: None,
        }
    }

    pub fn grid(&self) -> MonthGrid {
        MonthGrid::new(self.month)
    }

    pub fn prev_month(&mut self) {
        self.month = self.month.prev();
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn select(&mut self, date: NaiveDate) {
        self.selected = Some(date);
    }

    pub fn selected_tasks<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        match self.selected {
            Some(date) => tasks_on(tasks, date),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rank;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, created_at: &str) -> Task {
        Task {
            id: id.into(),
            text: id.into(),
            tag: "general".into(),
            rank: Rank::default(),
            created_at: created_at.into(),
        }
    }

    #[test]
    fn march_2024_spans_late_february_to_early_april() {
        let grid = MonthGrid::new(Month::new(2024, 3).unwrap());
        assert_eq!(grid.month_start, date(2024, 3, 1));
        assert_eq!(grid.month_start.weekday(), Weekday::Fri);
        assert_eq!(grid.month_end, date(2024, 3, 31));
        assert_eq!(grid.grid_start, date(2024, 2, 25));
        assert_eq!(grid.grid_end, date(2024, 4, 6));
        assert_eq!(grid.dates().count(), 42);
    }

    #[test]
    fn month_starting_on_sunday_has_no_leading_days() {
        let grid = MonthGrid::new(Month::new(2024, 9).unwrap());
        assert_eq!(grid.grid_start, grid.month_start);
        assert_eq!(grid.grid_end, date(2024, 10, 5));
    }

    #[test]
    fn february_2015_fits_exactly_four_weeks() {
        let grid = MonthGrid::new(Month::new(2015, 2).unwrap());
        assert_eq!(grid.grid_start, date(2015, 2, 1));
        assert_eq!(grid.grid_end, date(2015, 2, 28));
        assert_eq!(grid.dates().count(), 28);
    }

    #[test]
    fn every_grid_is_whole_weeks_and_ordered() {
        let mut month = Month::new(2023, 1).unwrap();
        for _ in 0..36 {
            let grid = MonthGrid::new(month);
            assert_eq!(grid.dates().count() % 7, 0);
            assert!(grid.grid_start <= grid.month_start);
            assert!(grid.month_start <= grid.month_end);
            assert!(grid.month_end <= grid.grid_end);
            assert_eq!(grid.grid_start.weekday(), Weekday::Sun);
            assert_eq!(grid.grid_end.weekday(), Weekday::Sat);
            month = month.next();
        }
    }

    #[test]
    fn dates_iterator_restarts() {
        let grid = MonthGrid::new(Month::new(2024, 3).unwrap());
        let first = grid.dates().collect::<Vec<_>>();
        let second = grid.dates().collect::<Vec<_>>();
        assert_eq!(first, second);
        assert_eq!(first.first(), Some(&grid.grid_start));
        assert_eq!(first.last(), Some(&grid.grid_end));
    }

    #[test]
    fn cells_flag_month_membership_and_tasks() {
        let tasks = vec![
            task("a", "2024-03-15T10:00"),
            task("b", "2024-02-26T23:59"),
            task("c", "nope"),
        ];
        let grid = MonthGrid::new(Month::new(2024, 3).unwrap());
        let cells = grid.cells(&tasks);
        let find = |d: NaiveDate| cells.iter().find(|c| c.date == d).copied().unwrap();

        let feb = find(date(2024, 2, 26));
        assert!(!feb.in_current_month);
        assert!(feb.has_task);

        let mid = find(date(2024, 3, 15));
        assert!(mid.in_current_month);
        assert!(mid.has_task);

        let empty = find(date(2024, 3, 16));
        assert!(empty.in_current_month);
        assert!(!empty.has_task);

        assert_eq!(cells, grid.cells(&tasks));
    }

    #[test]
    fn weeks_are_rows_of_seven() {
        let grid = MonthGrid::new(Month::new(2024, 3).unwrap());
        let weeks = grid.weeks(&[]);
        assert_eq!(weeks.len(), 6);
        assert!(weeks.iter().all(|w| w.len() == 7));
    }

    #[test]
    fn navigation_moves_by_calendar_month() {
        let jan = Month::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), Month::new(2023, 12).unwrap());
        assert_eq!(jan.next(), Month::new(2024, 2).unwrap());
        assert_eq!(jan.next().last_day(), date(2024, 2, 29));
        assert_eq!(Month::new(2024, 12).unwrap().next(), Month::new(2025, 1).unwrap());
    }

    #[test]
    fn parses_and_displays_months() {
        assert_eq!("2024-03".parse::<Month>(), Month::new(2024, 3));
        assert!(matches!("2024-13".parse::<Month>(), Err(MonthError::OutOfRange(13))));
        assert!(matches!("march".parse::<Month>(), Err(MonthError::Parse(_))));
        assert_eq!(Month::new(2024, 3).unwrap().to_string(), "March 2024");
    }

    #[test]
    fn selection_survives_month_changes() {
        let tasks = vec![task("a", "2024-03-15T10:00"), task("b", "2024-03-16")];
        let mut state = CalendarState::new(Month::new(2024, 3).unwrap());
        assert!(state.selected_tasks(&tasks).is_empty());

        state.select(date(2024, 3, 15));
        state.next_month();
        state.next_month();
        assert_eq!(state.month, Month::new(2024, 5).unwrap());
        let selected = state.selected_tasks(&tasks);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "a");

        state.prev_month();
        assert_eq!(state.month, Month::new(2024, 4).unwrap());
        assert_eq!(state.selected, Some(date(2024, 3, 15)));
    }

    #[test]
    fn has_task_ignores_time_of_day() {
        let tasks = vec![task("a", "2024-03-15T23:59:59")];
        assert!(has_task(date(2024, 3, 15), &tasks));
        assert!(!has_task(date(2024, 3, 16), &tasks));
    }
}
