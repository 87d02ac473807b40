use chrono::NaiveDate;
use daybook::aggregate::{count_past, count_today};
use daybook::calendar::{Month, MonthGrid};
use daybook::model::{Rank, Task};
use daybook::session::{Mode, SessionError, Submitted, Tracker};
use daybook::storage::{FileStore, StoreError, StoreLocation, StoreScope, TaskStore};
use std::fs;
use tempfile::tempdir;

fn file_store(dir: &std::path::Path) -> FileStore {
    FileStore::new(StoreLocation {
        path: dir.join("tasks.yml"),
        scope: StoreScope::Explicit,
    })
}

fn march() -> Month {
    Month::new(2024, 3).expect("valid month")
}

#[test]
fn create_edit_delete_through_file_store() {
    let temp = tempdir().expect("tempdir");
    let mut tracker = Tracker::new(file_store(temp.path()), march());
    tracker.refresh().expect("initial refresh");
    assert!(tracker.tasks().is_empty());

    tracker.session_mut().set_text("write report");
    tracker.session_mut().set_tag("work");
    tracker.session_mut().set_rank(Rank::MAX);
    assert_eq!(tracker.submit().expect("create"), Submitted::Created);
    assert_eq!(tracker.tasks().len(), 1);

    let created = tracker.tasks()[0].clone();
    tracker.begin_edit(&created.id).expect("begin edit");
    tracker.session_mut().set_text("write final report");
    assert_eq!(tracker.submit().expect("update"), Submitted::Updated);
    assert_eq!(tracker.session().mode(), &Mode::Create);

    let updated = tracker.task(&created.id).expect("task still present").clone();
    assert_eq!(updated.text, "write final report");
    assert_eq!(updated.tag, "work");
    assert_eq!(updated.created_at, created.created_at);

    tracker.begin_edit(&created.id).expect("begin edit again");
    tracker.delete(&created.id).expect("delete");
    assert_eq!(tracker.session().mode(), &Mode::Create);
    assert!(tracker.session().draft().text.is_empty());
    assert!(tracker.tasks().is_empty());
}

#[test]
fn empty_draft_leaves_file_untouched() {
    let temp = tempdir().expect("tempdir");
    let mut tracker = Tracker::new(file_store(temp.path()), march());
    tracker.refresh().expect("refresh");
    assert!(matches!(tracker.submit(), Err(SessionError::Validation)));
    assert!(!temp.path().join("tasks.yml").exists());
}

#[test]
fn deleting_twice_reports_not_found() {
    let temp = tempdir().expect("tempdir");
    let mut store = file_store(temp.path());
    store
        .create_task("one-off", "general", Rank::MIN)
        .expect("create");
    let id = store.list_tasks().expect("list")[0].id.clone();

    let mut tracker = Tracker::new(store, march());
    tracker.refresh().expect("refresh");
    tracker.delete(&id).expect("first delete");
    assert!(matches!(
        tracker.delete(&id),
        Err(SessionError::Store(StoreError::NotFound(_)))
    ));
}

#[test]
fn views_derive_from_hand_written_snapshot() {
    let temp = tempdir().expect("tempdir");
    fs::write(
        temp.path().join("tasks.yml"),
        "tasks:\n\
         - {id: a, text: standup, tag: routine, rank: 0, created_at: '2024-03-15T10:00'}\n\
         - {id: b, text: plan, tag: project, rank: 2, created_at: '2024-03-01'}\n\
         - {id: c, text: legacy, created_at: 'unknown'}\n",
    )
    .expect("write fixture");

    let mut tracker = Tracker::new(file_store(temp.path()), march());
    tracker.refresh().expect("refresh");

    let order = tracker
        .sorted()
        .iter()
        .map(|t| t.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["b", "a", "c"]);

    let now = NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid now");
    let summary = tracker.summary(now);
    assert_eq!(summary.today, 1);
    assert_eq!(summary.past, 2);
    assert_eq!(summary.by_tag.get("general"), Some(&1));
    assert_eq!(
        count_today(tracker.tasks(), now) + count_past(tracker.tasks(), now),
        3
    );

    let grid = tracker.grid();
    let marked = grid
        .cells(tracker.tasks())
        .into_iter()
        .filter(|c| c.has_task)
        .map(|c| c.date)
        .collect::<Vec<_>>();
    assert_eq!(
        marked,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            NaiveDate::from_ymd_opt(2024, 3, 15).expect("date"),
        ]
    );

    tracker
        .calendar_mut()
        .select(NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
    tracker.calendar_mut().next_month();
    let selected: Vec<&Task> = tracker.selected_tasks();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].text, "plan");
    assert_eq!(tracker.grid(), MonthGrid::new(Month::new(2024, 4).expect("april")));
}
