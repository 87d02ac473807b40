use crate::aggregate::{sort_chronological, Summary};
use crate::calendar::{CalendarState, Month, MonthGrid};
use crate::model::{is_submittable, Draft, Rank, Task, TaskId};
use crate::storage::{StoreError, TaskStore};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit { task_id: TaskId },
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("task text is required")]
    Validation,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("task not in snapshot: {0}")]
    UnknownTask(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Created,
    Updated,
}

/// The single draft being composed, and whether it creates or edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    draft: Draft,
    mode: Mode,
}

impl Default for EditSession {
    fn default() -> Self {
        EditSession {
            draft: Draft::default(),
            mode: Mode::Create,
        }
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn editing(&self) -> Option<&str> {
        match &self.mode {
            Mode::Edit { task_id } => Some(task_id.as_str()),
            Mode::Create => None,
        }
    }

    /// Loads `task` into the draft. Any draft in progress is replaced.
    pub fn begin_edit(&mut self, task: &Task) {
        if let Some(previous) = self.editing() {
            tracing::debug!(previous, next = %task.id, "replacing edit session");
        }
        self.draft = Draft::from_task(task);
        self.mode = Mode::Edit {
            task_id: task.id.clone(),
        };
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Sends the draft to the store. The session is reset only when the
    /// store accepts the write.
    pub fn submit<S: TaskStore + ?Sized>(&mut self, store: &mut S) -> Result<Submitted, SessionError> {
        if !is_submittable(&self.draft) {
            tracing::debug!("refusing to submit empty draft");
            return Err(SessionError::Validation);
        }
        let draft = self.draft.clone().normalized();
        let outcome = match &self.mode {
            Mode::Create => {
                store.create_task(&draft.text, &draft.tag, draft.rank)?;
                Submitted::Created
            }
            Mode::Edit { task_id } => {
                store.update_task(task_id, &draft.text, &draft.tag, draft.rank)?;
                Submitted::Updated
            }
        };
        self.reset();
        Ok(outcome)
    }

    /// Drops the edit session if it targets a task that no longer exists.
    pub fn task_deleted(&mut self, id: &str) {
        if self.editing() == Some(id) {
            tracing::debug!(id, "edited task deleted; clearing draft");
            self.reset();
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    pub fn push_char(&mut self, ch: char) {
        self.draft.text.push(ch);
    }

    pub fn pop_char(&mut self) {
        self.draft.text.pop();
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.draft.tag = tag.into();
    }

    /// Advances the tag to the next palette entry, wrapping around. A tag
    /// outside the palette moves to the first entry.
    pub fn cycle_tag(&mut self, palette: &[String]) {
        if palette.is_empty() {
            return;
        }
        let next = palette
            .iter()
            .position(|t| *t == self.draft.tag)
            .map(|idx| (idx + 1) % palette.len())
            .unwrap_or(0);
        self.draft.tag = palette[next].clone();
    }

    pub fn set_rank(&mut self, rank: Rank) {
        self.draft.rank = rank;
    }

    pub fn raise_rank(&mut self) {
        self.draft.rank = self.draft.rank.raise();
    }

    pub fn lower_rank(&mut self) {
        self.draft.rank = self.draft.rank.lower();
    }

    fn reset(&mut self) {
        *self = EditSession::default();
    }
}

/// Application state: the store, the latest snapshot, the edit session and
/// the calendar position.
pub struct Tracker<S: TaskStore> {
    store: S,
    tasks: Vec<Task>,
    session: EditSession,
    calendar: CalendarState,
}

impl<S: TaskStore> Tracker<S> {
    pub fn new(store: S, month: Month) -> Self {
        Tracker {
            store,
            tasks: Vec::new(),
            session: EditSession::new(),
            calendar: CalendarState::new(month),
        }
    }

    /// Replaces the snapshot with a fresh full listing. On failure the
    /// previous snapshot is kept.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        match self.store.list_tasks() {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "refreshed snapshot");
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "listing tasks failed");
                Err(err.into())
            }
        }
    }

    pub fn submit(&mut self) -> Result<Submitted, SessionError> {
        let outcome = self.session.submit(&mut self.store).map_err(|err| {
            if let SessionError::Store(inner) = &err {
                tracing::warn!(error = %inner, "submit failed");
            }
            err
        })?;
        self.refresh()?;
        Ok(outcome)
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<(), SessionError> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| SessionError::UnknownTask(id.to_string()))?;
        self.session.begin_edit(task);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    pub fn delete(&mut self, id: &str) -> Result<(), SessionError> {
        if let Err(err) = self.store.delete_task(id) {
            tracing::warn!(id, error = %err, "delete failed");
            return Err(err.into());
        }
        self.session.task_deleted(id);
        self.refresh()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn sorted(&self) -> Vec<&Task> {
        sort_chronological(&self.tasks)
    }

    pub fn summary(&self, now: NaiveDateTime) -> Summary {
        Summary::from_tasks(&self.tasks, now)
    }

    pub fn grid(&self) -> MonthGrid {
        self.calendar.grid()
    }

    pub fn selected_tasks(&self) -> Vec<&Task> {
        self.calendar.selected_tasks(&self.tasks)
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    pub fn calendar(&self) -> &CalendarState {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut CalendarState {
        &mut self.calendar
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
