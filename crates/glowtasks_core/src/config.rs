//! Client configuration.
//!
//! # Responsibility
//! - Resolve service URL, data directory and log level from the environment.
//! - Derive on-disk locations for the state database and the log files.
//!
//! # Invariants
//! - `data_dir` is absolute, so derived paths are valid for logging init.
//! - Blank environment values are treated as unset.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const API_URL_ENV: &str = "GLOWTASKS_API_URL";
pub const DATA_DIR_ENV: &str = "GLOWTASKS_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "GLOWTASKS_LOG_LEVEL";

const STATE_DB_FILE_NAME: &str = "glowtasks.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: std::env::temp_dir().join("glowtasks"),
            log_level: default_log_level().to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `GLOWTASKS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            api_base_url: read(API_URL_ENV).unwrap_or(defaults.api_base_url),
            data_dir: read(DATA_DIR_ENV)
                .map(|value| absolutize(Path::new(&value)))
                .unwrap_or(defaults.data_dir),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = absolutize(data_dir.as_ref());
        self
    }

    pub fn state_db_path(&self) -> PathBuf {
        self.data_dir.join(STATE_DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
