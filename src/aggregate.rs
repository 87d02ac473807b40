use crate::model::Task;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Tasks in ascending `created_at` order. The sort is stable, and tasks
/// whose timestamp cannot be parsed are placed after every dated task.
pub fn sort_chronological(tasks: &[Task]) -> Vec<&Task> {
    let mut keyed = tasks
        .iter()
        .map(|task| (task.created(), task))
        .collect::<Vec<_>>();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref()));
    keyed.into_iter().map(|(_, task)| task).collect()
}

fn compare_keys(a: Option<&NaiveDateTime>, b: Option<&NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn count_by_tag(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Tasks created on the same local calendar day as `now`.
pub fn count_today(tasks: &[Task], now: NaiveDateTime) -> usize {
    let today = now.date();
    tasks
        .iter()
        .filter(|task| task.created_on() == Some(today))
        .count()
}

/// Everything that is not "today", including undated and future tasks.
pub fn count_past(tasks: &[Task], now: NaiveDateTime) -> usize {
    tasks.len() - count_today(tasks, now)
}

/// Sidebar figures derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub today: usize,
    pub past: usize,
    pub by_tag: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_tasks(tasks: &[Task], now: NaiveDateTime) -> Self {
        let today = count_today(tasks, now);
        let summary = Summary {
            today,
            past: tasks.len() - today,
            by_tag: count_by_tag(tasks),
        };
        tracing::debug!(
            today = summary.today,
            past = summary.past,
            tags = summary.by_tag.len(),
            "derived summary"
        );
        summary
    }

    pub fn total(&self) -> usize {
        self.today + self.past
    }
}
