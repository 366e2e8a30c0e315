// ABOUTME: Runtime paths and storage settings for the coach service read from the environment
// ABOUTME: Data directory, user-state file, catalog directory, log directory, and history window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Runtime configuration
//!
//! | Variable            | Default                  |
//! |---------------------|--------------------------|
//! | `CRUX_DATA_DIR`     | `data`                   |
//! | `CRUX_STATE_PATH`   | `<data>/user_state.json` |
//! | `CRUX_CATALOG_DIR`  | `<data>/catalog`         |
//! | `CRUX_LOGS_DIR`     | `<data>/logs`            |
//! | `CRUX_HISTORY_DAYS` | `30`                     |

use std::env;
use std::path::PathBuf;

use crux_core::errors::{AppError, AppResult, ErrorCode};
use tracing::debug;

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default window of session history read for exercise recency
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Filesystem layout and storage settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachConfig {
    /// Root of all persisted data
    pub data_dir: PathBuf,
    /// User-state JSON document
    pub state_path: PathBuf,
    /// Catalog root (`exercises/`, `templates/`, `sessions/`)
    pub catalog_dir: PathBuf,
    /// Session and outdoor JSONL logs
    pub logs_dir: PathBuf,
    /// Days of session history used for exercise recency
    pub history_days: i64,
}

impl CoachConfig {
    /// Layout rooted at `data_dir` with default file names
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            state_path: data_dir.join("user_state.json"),
            catalog_dir: data_dir.join("catalog"),
            logs_dir: data_dir.join("logs"),
            history_days: DEFAULT_HISTORY_DAYS,
            data_dir,
        }
    }

    /// Load from `CRUX_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error when `CRUX_HISTORY_DAYS` is not a
    /// non-negative integer
    pub fn from_env() -> AppResult<Self> {
        let data_dir = env::var("CRUX_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_owned());
        let mut config = Self::with_data_dir(data_dir);

        if let Some(path) = env_path("CRUX_STATE_PATH") {
            config.state_path = path;
        }
        if let Some(path) = env_path("CRUX_CATALOG_DIR") {
            config.catalog_dir = path;
        }
        if let Some(path) = env_path("CRUX_LOGS_DIR") {
            config.logs_dir = path;
        }
        if let Ok(raw) = env::var("CRUX_HISTORY_DAYS") {
            config.history_days = parse_history_days(&raw)?;
        }

        debug!(
            data_dir = %config.data_dir.display(),
            state_path = %config.state_path.display(),
            catalog_dir = %config.catalog_dir.display(),
            logs_dir = %config.logs_dir.display(),
            history_days = config.history_days,
            "coach config loaded"
        );
        Ok(config)
    }

    /// Rejected-entry log for invalid session log entries
    #[must_use]
    pub fn rejected_log_path(&self) -> PathBuf {
        self.logs_dir.join("session_logs_rejected.jsonl")
    }

    /// Quarantine log for entries without the current schema version
    #[must_use]
    pub fn legacy_log_path(&self) -> PathBuf {
        self.logs_dir.join("_bak").join("legacy_session_logs.jsonl")
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_history_days(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|days| *days >= 0)
        .ok_or_else(|| {
            AppError::new(
                ErrorCode::ConfigInvalid,
                format!("CRUX_HISTORY_DAYS must be a non-negative integer, got '{raw}'"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_layout_follows_data_dir() {
        let config = CoachConfig::with_data_dir("/srv/crux");
        assert_eq!(config.state_path, PathBuf::from("/srv/crux/user_state.json"));
        assert_eq!(config.catalog_dir, PathBuf::from("/srv/crux/catalog"));
        assert_eq!(
            config.legacy_log_path(),
            PathBuf::from("/srv/crux/logs/_bak/legacy_session_logs.jsonl")
        );
        assert_eq!(config.history_days, DEFAULT_HISTORY_DAYS);
    }

    #[test]
    fn test_history_days_parsing() {
        assert_eq!(parse_history_days(" 14 ").unwrap(), 14);
        assert!(parse_history_days("-1").is_err());
        assert!(parse_history_days("two weeks").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::set_var("CRUX_DATA_DIR", "/tmp/crux-data");
        env::set_var("CRUX_LOGS_DIR", "/tmp/crux-logs");
        env::set_var("CRUX_HISTORY_DAYS", "7");
        let config = CoachConfig::from_env().unwrap();
        env::remove_var("CRUX_DATA_DIR");
        env::remove_var("CRUX_LOGS_DIR");
        env::remove_var("CRUX_HISTORY_DAYS");

        assert_eq!(config.state_path, PathBuf::from("/tmp/crux-data/user_state.json"));
        assert_eq!(config.logs_dir, PathBuf::from("/tmp/crux-logs"));
        assert_eq!(config.history_days, 7);
    }
}
