// ABOUTME: Per-year session log files plus the rejected-entry and legacy quarantine logs
// ABOUTME: Also extracts recently used exercise ids for resolver variety
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crux_core::dates::{add_days, now_timestamp, parse_date_lenient};
use crux_core::errors::AppResult;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::jsonl;
use crate::config::CoachConfig;

/// File name prefix of the per-year session logs
pub const SESSION_LOG_PREFIX: &str = "sessions_";

/// The session logs of one data directory
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
    rejected_path: PathBuf,
    legacy_path: PathBuf,
}

impl SessionLog {
    /// Logs under `dir` with the default quarantine locations
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            rejected_path: dir.join("session_logs_rejected.jsonl"),
            legacy_path: dir.join("_bak").join("legacy_session_logs.jsonl"),
            dir,
        }
    }

    /// Logs at the locations named by the config
    #[must_use]
    pub fn from_config(config: &CoachConfig) -> Self {
        Self {
            dir: config.logs_dir.clone(),
            rejected_path: config.rejected_log_path(),
            legacy_path: config.legacy_log_path(),
        }
    }

    /// Log directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that receives entries dated `date`
    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        jsonl::yearly_path(&self.dir, SESSION_LOG_PREFIX, date)
    }

    /// Rejected-entry log
    #[must_use]
    pub fn rejected_path(&self) -> &Path {
        &self.rejected_path
    }

    /// Legacy quarantine log
    #[must_use]
    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    /// Append an entry to the file of its year
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be written
    pub fn append<T: Serialize>(&self, date: NaiveDate, entry: &T) -> AppResult<PathBuf> {
        let path = self.path_for(date);
        jsonl::append(&path, entry)?;
        info!(%date, path = %path.display(), "session log entry appended");
        Ok(path)
    }

    /// Record an entry that failed validation
    ///
    /// # Errors
    ///
    /// Returns a storage error when the rejected log cannot be written
    pub fn reject(&self, entry: &Value, errors: &[String]) -> AppResult<PathBuf> {
        let record = json!({
            "rejected_at": now_timestamp(),
            "reason": "invalid",
            "errors": errors,
            "entry": entry,
        });
        jsonl::append(&self.rejected_path, &record)?;
        warn!(errors = errors.len(), path = %self.rejected_path.display(), "session log entry rejected");
        Ok(self.rejected_path.clone())
    }

    /// Route an entry without the current schema version to the legacy log
    ///
    /// # Errors
    ///
    /// Returns a storage error when the legacy log cannot be written
    pub fn quarantine_legacy(&self, entry: &Value, reason: &str) -> AppResult<PathBuf> {
        let record = json!({
            "quarantined_at": now_timestamp(),
            "reason": reason,
            "entry": entry,
        });
        jsonl::append(&self.legacy_path, &record)?;
        warn!(%reason, path = %self.legacy_path.display(), "legacy session log entry quarantined");
        Ok(self.legacy_path.clone())
    }

    /// Every readable entry across all years, in file order
    ///
    /// # Errors
    ///
    /// Returns a storage error when the directory or a file cannot be read
    pub fn entries(&self) -> AppResult<Vec<Value>> {
        let mut entries = Vec::new();
        for path in jsonl::yearly_files(&self.dir, SESSION_LOG_PREFIX)? {
            entries.extend(jsonl::read_values(&path)?);
        }
        Ok(entries)
    }

    /// Exercise ids used in the last `days` days before `today`, most recent first
    ///
    /// Entries without a date count as recent. Ids are lowercased.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the logs cannot be read
    pub fn recent_exercise_ids(&self, today: NaiveDate, days: i64) -> AppResult<Vec<String>> {
        let cutoff = add_days(today, -days);
        let mut dated: Vec<(Option<NaiveDate>, Vec<String>)> = self
            .entries()?
            .iter()
            .filter_map(|entry| {
                let date = entry
                    .get("date")
                    .and_then(Value::as_str)
                    .and_then(parse_date_lenient);
                if date.is_some_and(|d| d < cutoff) {
                    return None;
                }
                Some((date, exercise_ids(entry)))
            })
            .collect();
        // stable: same-day entries keep file order
        dated.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(dated.into_iter().flat_map(|(_, ids)| ids).collect())
    }
}

fn ids_in(list: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("exercise_id").and_then(Value::as_str))
        .map(|id| id.trim().to_lowercase())
        .filter(|id| !id.is_empty())
}

/// Exercise ids of a log entry: resolved instances first, then outcomes
fn exercise_ids(entry: &Value) -> Vec<String> {
    let direct = entry
        .get("exercise_instances")
        .filter(|v| v.as_array().is_some_and(|a| !a.is_empty()));
    let instances = direct.or_else(|| {
        entry
            .get("resolved_session")
            .and_then(|r| r.get("exercise_instances"))
    });
    ids_in(instances)
        .chain(ids_in(entry.get("exercise_outcomes")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(raw: &str) -> NaiveDate {
        parse_date_lenient(raw).unwrap()
    }

    #[test]
    fn test_entries_land_in_year_files() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path());
        let path = log
            .append(date("2025-12-30"), &json!({"date": "2025-12-30"}))
            .unwrap();
        assert!(path.ends_with("sessions_2025.jsonl"));
        log.append(date("2026-01-02"), &json!({"date": "2026-01-02"}))
            .unwrap();
        assert_eq!(log.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_quarantine_records_shape() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path());
        log.reject(&json!({"date": "x"}), &["bad".to_owned()]).unwrap();
        log.quarantine_legacy(&json!({"date": "y"}), "missing_schema_version")
            .unwrap();

        let rejected = jsonl::read_values(log.rejected_path()).unwrap();
        assert_eq!(rejected[0]["reason"], "invalid");
        assert_eq!(rejected[0]["errors"], json!(["bad"]));
        assert_eq!(rejected[0]["entry"]["date"], "x");
        assert!(rejected[0]["rejected_at"].is_string());

        let legacy = jsonl::read_values(log.legacy_path()).unwrap();
        assert_eq!(legacy[0]["reason"], "missing_schema_version");
        assert!(legacy[0]["quarantined_at"].is_string());
        assert!(log.legacy_path().ends_with("_bak/legacy_session_logs.jsonl"));
    }

    #[test]
    fn test_recent_ids_newest_first_within_window() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path());
        log.append(
            date("2026-01-01"),
            &json!({"date": "2026-01-01", "exercise_instances": [{"exercise_id": "too_old"}]}),
        )
        .unwrap();
        log.append(
            date("2026-01-08"),
            &json!({"date": "2026-01-08",
                    "resolved_session": {"exercise_instances": [{"exercise_id": "Max_Hang_5s"}]}}),
        )
        .unwrap();
        log.append(
            date("2026-01-10"),
            &json!({"date": "2026-01-10",
                    "exercise_instances": [{"exercise_id": "pullup"}],
                    "exercise_outcomes": [{"exercise_id": "limit_bouldering"}]}),
        )
        .unwrap();

        let ids = log.recent_exercise_ids(date("2026-01-12"), 7).unwrap();
        assert_eq!(ids, ["pullup", "limit_bouldering", "max_hang_5s"]);
    }
}
