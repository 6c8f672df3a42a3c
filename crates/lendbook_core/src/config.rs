//! Runtime settings for embedding binaries.
//!
//! Values come from environment variables with build-mode defaults:
//! - `LENDBOOK_DB_PATH`: database file, defaults to `library.db`.
//! - `LENDBOOK_LOG_LEVEL`: defaults to `default_log_level()`.
//! - `LENDBOOK_LOG_DIR`: absolute log directory; file logging is off when unset.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "library.db";
pub const DB_PATH_ENV: &str = "LENDBOOK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "LENDBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "LENDBOOK_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
