use crate::model::{Rank, Task, TaskId};
use chrono::Local;
use directories::ProjectDirs;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STORE_DIR: &str = ".daybook";
const STORE_FILE: &str = "tasks.yml";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("reading or writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed task file {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no data directory available for the global store")]
    NoDataDir,
}

/// The task collection collaborator. Ids and creation timestamps are
/// assigned on the store side.
pub trait TaskStore {
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;
    fn create_task(&mut self, text: &str, tag: &str, rank: Rank) -> Result<(), StoreError>;
    fn update_task(&mut self, id: &str, text: &str, tag: &str, rank: Rank)
        -> Result<(), StoreError>;
    fn delete_task(&mut self, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Global,
    Explicit,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Project => "project",
            StoreScope::Global => "global",
            StoreScope::Explicit => "explicit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub path: PathBuf,
    pub scope: StoreScope,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// YAML-file task store.
#[derive(Debug, Clone)]
pub struct FileStore {
    location: StoreLocation,
}

impl FileStore {
    pub fn new(location: StoreLocation) -> Self {
        FileStore { location }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    fn load(&self) -> Result<TaskFile, StoreError> {
        let path = &self.location.path;
        if !path.exists() {
            return Ok(TaskFile::default());
        }
        let data = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(TaskFile::default());
        }
        serde_yaml::from_str(&data).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })
    }

    fn save(&self, file: &TaskFile) -> Result<(), StoreError> {
        let path = &self.location.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = serde_yaml::to_string(file).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })?;
        fs::write(path, serialized).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl TaskStore for FileStore {
    fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.load()?.tasks)
    }

    fn create_task(&mut self, text: &str, tag: &str, rank: Rank) -> Result<(), StoreError> {
        let mut file = self.load()?;
        let mut id = generate_id();
        while file.tasks.iter().any(|t| t.id == id) {
            id = generate_id();
        }
        file.tasks.push(Task {
            id: id.clone(),
            text: text.to_string(),
            tag: tag.to_string(),
            rank,
            created_at: Local::now().to_rfc3339(),
        });
        self.save(&file)?;
        tracing::info!(%id, tag, "created task");
        Ok(())
    }

    fn update_task(
        &mut self,
        id: &str,
        text: &str,
        tag: &str,
        rank: Rank,
    ) -> Result<(), StoreError> {
        let mut file = self.load()?;
        let task = file
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.text = text.to_string();
        task.tag = tag.to_string();
        task.rank = rank;
        self.save(&file)?;
        tracing::info!(id, "updated task");
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> Result<(), StoreError> {
        let mut file = self.load()?;
        let before = file.tasks.len();
        file.tasks.retain(|t| t.id != id);
        if file.tasks.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.save(&file)?;
        tracing::info!(id, "deleted task");
        Ok(())
    }
}

pub fn init_project_store(cwd: &Path) -> Result<StoreLocation, StoreError> {
    let location = StoreLocation {
        path: cwd.join(STORE_DIR).join(STORE_FILE),
        scope: StoreScope::Project,
    };
    if !location.path.exists() {
        FileStore::new(location.clone()).save(&TaskFile::default())?;
    }
    Ok(location)
}

/// Explicit path wins, then the nearest `.daybook/tasks.yml` above `start`,
/// then the per-user data directory.
pub fn locate_store(start: &Path, explicit: Option<&Path>) -> Result<StoreLocation, StoreError> {
    if let Some(path) = explicit {
        return Ok(StoreLocation {
            path: path.to_path_buf(),
            scope: StoreScope::Explicit,
        });
    }
    if let Some(project_path) = find_project_store(start) {
        return Ok(StoreLocation {
            path: project_path,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        path: global_store_path()?,
        scope: StoreScope::Global,
    })
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(STORE_DIR).join(STORE_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_path() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("", "", "daybook").ok_or(StoreError::NoDataDir)?;
    Ok(dirs.data_dir().join(STORE_FILE))
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> FileStore {
        FileStore::new(StoreLocation {
            path: dir.join("tasks.yml"),
            scope: StoreScope::Explicit,
        })
    }

    #[test]
    fn missing_file_lists_empty() {
        let temp = tempdir().unwrap();
        assert!(store_in(temp.path()).list_tasks().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_id_and_timestamp() {
        let temp = tempdir().unwrap();
        let mut store = store_in(temp.path());
        store.create_task("buy milk", "routine", Rank::MAX).unwrap();
        let tasks = store.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.len(), 6);
        assert_eq!(tasks[0].tag, "routine");
        assert!(tasks[0].created().is_some());
    }

    #[test]
    fn update_keeps_created_at() {
        let temp = tempdir().unwrap();
        let mut store = store_in(temp.path());
        store.create_task("draft", "general", Rank::MIN).unwrap();
        let before = store.list_tasks().unwrap().remove(0);
        store
            .update_task(&before.id, "final", "work", Rank::MAX)
            .unwrap();
        let after = store.list_tasks().unwrap().remove(0);
        assert_eq!(after.text, "final");
        assert_eq!(after.tag, "work");
        assert_eq!(after.rank, Rank::MAX);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let temp = tempdir().unwrap();
        let mut store = store_in(temp.path());
        assert!(matches!(
            store.update_task("zzz", "x", "general", Rank::MIN),
            Err(StoreError::NotFound(id)) if id == "zzz"
        ));
        assert!(matches!(
            store.delete_task("zzz"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("tasks.yml"), "tasks: [ {id: 1").unwrap();
        assert!(matches!(
            store_in(temp.path()).list_tasks(),
            Err(StoreError::Format { .. })
        ));
    }

    #[test]
    fn locates_nearest_project_store() {
        let temp = tempdir().unwrap();
        let created = init_project_store(temp.path()).unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let found = locate_store(&nested, None).unwrap();
        assert_eq!(found.scope, StoreScope::Project);
        assert_eq!(found.path, created.path);
    }

    #[test]
    fn explicit_path_wins() {
        let temp = tempdir().unwrap();
        init_project_store(temp.path()).unwrap();
        let explicit = temp.path().join("elsewhere.yml");
        let found = locate_store(temp.path(), Some(&explicit)).unwrap();
        assert_eq!(found.scope, StoreScope::Explicit);
        assert_eq!(found.path, explicit);
    }
}
