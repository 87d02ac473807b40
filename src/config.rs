use crate::model::DEFAULT_TAG;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const STORE_ENV_VAR: &str = "DAYBOOK_STORE";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tags offered when composing a task.
    pub tags: Vec<String>,
    /// Explicit task file; bypasses project/global lookup.
    pub store: Option<PathBuf>,
    pub log_filter: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tags: ["general", "project", "work", "routine"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            store: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads the per-user config file, falling back to defaults when it
    /// does not exist, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(std::env::var(STORE_ENV_VAR).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = if data.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };
        config.sanitize();
        Ok(config)
    }

    fn apply_env(&mut self, store: Option<String>) {
        if let Some(raw) = store {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.store = Some(PathBuf::from(trimmed));
            }
        }
    }

    fn sanitize(&mut self) {
        self.tags.retain(|t| !t.trim().is_empty());
        if !self.tags.iter().any(|t| t == DEFAULT_TAG) {
            self.tags.insert(0, DEFAULT_TAG.to_string());
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = "warn".to_string();
        }
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "daybook").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = tempdir().unwrap();
        let config = Config::from_file(&temp.path().join("config.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tags, vec!["general", "project", "work", "routine"]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "tags: [home, work]\nlog_filter: debug\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.tags, vec!["general", "home", "work"]);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.store, None);
    }

    #[test]
    fn bad_yaml_is_reported() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "tags: [unterminated").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_store_overrides_file() {
        let mut config = Config::default();
        config.apply_env(Some("  /tmp/tasks.yml ".into()));
        assert_eq!(config.store, Some(PathBuf::from("/tmp/tasks.yml")));
        config.apply_env(Some("   ".into()));
        assert_eq!(config.store, Some(PathBuf::from("/tmp/tasks.yml")));
    }
}
