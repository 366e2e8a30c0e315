// ABOUTME: Append-only JSON Lines files with a reader that tolerates torn or corrupt lines
// ABOUTME: Per-year file naming shared by the session log and the outdoor log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use crux_core::errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

const EXTENSION: &str = ".jsonl";

/// `<dir>/<prefix><year>.jsonl` for the year of `date`
#[must_use]
pub fn yearly_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{prefix}{}{EXTENSION}", date.year()))
}

/// Append one record as a single line, creating parent directories
///
/// # Errors
///
/// Returns a storage error when the file cannot be opened or written
pub fn append<T: Serialize>(path: &Path, record: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::storage(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::storage(format!("Failed to open {}: {e}", path.display())))?;
    file.write_all(line.as_bytes())
        .map_err(|e| AppError::storage(format!("Failed to append to {}: {e}", path.display())))?;
    debug!(path = %path.display(), bytes = line.len(), "jsonl record appended");
    Ok(())
}

/// Every parseable line of a JSONL file; a missing file reads as empty
///
/// Lines that fail to parse (typically a torn last line) are dropped with a
/// warning.
///
/// # Errors
///
/// Returns a storage error when the file exists but cannot be read
pub fn read_values(path: &Path) -> AppResult<Vec<Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::storage(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let mut values = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => values.push(value),
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "discarding unreadable JSONL line"
            ),
        }
    }
    Ok(values)
}

/// `<prefix>*.jsonl` files in `dir`, sorted by name; a missing directory is empty
///
/// # Errors
///
/// Returns a storage error when the directory exists but cannot be listed
pub fn yearly_files(dir: &Path, prefix: &str) -> AppResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::storage(format!(
                "Failed to list {}: {e}",
                dir.display()
            )))
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(EXTENSION))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_torn_last_line_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions_2026.jsonl");
        append(&path, &json!({"date": "2026-01-05"})).unwrap();
        append(&path, &json!({"date": "2026-01-06"})).unwrap();
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("{\"date\": \"2026-01-");
        fs::write(&path, text).unwrap();

        let values = read_values(&path).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["date"], "2026-01-06");
    }

    #[test]
    fn test_missing_paths_read_as_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_values(&dir.path().join("nope.jsonl")).unwrap().is_empty());
        assert!(yearly_files(&dir.path().join("nope"), "sessions_").unwrap().is_empty());
    }

    #[test]
    fn test_yearly_files_filter_by_prefix() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        append(&yearly_path(dir.path(), "sessions_", date), &json!({})).unwrap();
        append(&dir.path().join("sessions_2026.jsonl"), &json!({})).unwrap();
        append(&dir.path().join("outdoor_sessions_2026.jsonl"), &json!({})).unwrap();
        append(&dir.path().join("session_logs_rejected.jsonl"), &json!({})).unwrap();

        let files = yearly_files(dir.path(), "sessions_").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["sessions_2025.jsonl", "sessions_2026.jsonl"]);
    }
}
