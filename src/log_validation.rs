// ABOUTME: Gatekeeper for manually authored session log entries before they reach the per-year log
// ABOUTME: Routes legacy entries to quarantine, normalizes, autofills total load, validates, then appends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Session log entry validation
//!
//! Entries are handled as raw JSON so that a malformed entry can still be
//! quarantined exactly as it was submitted. The pipeline is:
//!
//! 1. schema version gate (anything but `session_log_entry.v1` is legacy)
//! 2. normalization (`logged_at`, default outcome status)
//! 3. total-load autofill from bodyweight, added weight, and assistance
//! 4. structural validation
//! 5. append to `sessions_<year>.jsonl`, or record in the rejected log

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crux_core::dates::{now_timestamp, parse_date_lenient};
use crux_core::errors::{AppError, AppResult};
use crux_core::models::SESSION_LOG_SCHEMA_VERSION;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::storage::SessionLog;

/// Accepted values of `exercise_outcomes[].actual.status`
pub const OUTCOME_STATUSES: [&str; 4] = ["planned", "done", "skipped", "modified"];

/// Process exit code for an appended entry
pub const EXIT_OK: i32 = 0;
/// Process exit code for an entry that failed validation
pub const EXIT_INVALID: i32 = 2;
/// Process exit code for an entry without the current schema version
pub const EXIT_LEGACY: i32 = 3;

/// Where an entry ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Written to the per-year session log
    Appended {
        /// File that received the entry
        path: PathBuf,
    },
    /// Failed validation and was written to the rejected log
    Rejected {
        /// Rejected log
        path: PathBuf,
        /// Every problem found
        errors: Vec<String>,
    },
    /// Lacked the current schema version and was quarantined
    Legacy {
        /// Legacy quarantine log
        path: PathBuf,
        /// Why the entry counts as legacy
        reason: String,
    },
}

impl AppendOutcome {
    /// Process exit code for this outcome
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Appended { .. } => EXIT_OK,
            Self::Rejected { .. } => EXIT_INVALID,
            Self::Legacy { .. } => EXIT_LEGACY,
        }
    }
}

/// Why an entry is legacy, or `None` when it carries the current schema version
#[must_use]
pub fn legacy_reason(entry: &Value) -> Option<String> {
    match entry.get("schema_version") {
        Some(Value::String(sv)) if sv.trim() == SESSION_LOG_SCHEMA_VERSION => None,
        Some(Value::String(sv)) => Some(format!("schema_version_not_v1:{sv}")),
        _ => Some("missing_schema_version".to_owned()),
    }
}

/// Stamp `logged_at` and give every outcome an `actual` object with a status
///
/// The schema version is never set here; a legacy entry stays legacy.
pub fn normalize(entry: &mut Value) {
    let Some(map) = entry.as_object_mut() else {
        return;
    };
    map.entry("logged_at")
        .or_insert_with(|| Value::String(now_timestamp()));

    let Some(outcomes) = map.get_mut("exercise_outcomes").and_then(Value::as_array_mut) else {
        return;
    };
    for outcome in outcomes.iter_mut().filter_map(Value::as_object_mut) {
        let actual = outcome
            .entry("actual")
            .or_insert_with(|| Value::Object(Map::new()));
        if !actual.is_object() {
            *actual = Value::Object(Map::new());
        }
        if let Some(actual) = actual.as_object_mut() {
            actual
                .entry("status")
                .or_insert_with(|| Value::String("planned".to_owned()));
        }
    }
}

/// Bodyweight for load autofill: the entry's own `user.bodyweight_kg`, then the stored state
#[must_use]
pub fn entry_bodyweight(entry: &Value, state_bodyweight: Option<f64>) -> Option<f64> {
    entry
        .get("user")
        .and_then(|user| user.get("bodyweight_kg"))
        .and_then(Value::as_f64)
        .or(state_bodyweight)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fill `actual.used_total_load_kg = bodyweight + added - assistance` where missing
///
/// Only outcomes that report added weight or assistance (including the
/// legacy `added_weight_kg` and `assistance_kg` names) are filled.
pub fn autofill_total_load(entry: &mut Value, bodyweight: Option<f64>) {
    let Some(bodyweight) = bodyweight else {
        return;
    };
    let Some(outcomes) = entry
        .get_mut("exercise_outcomes")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for actual in outcomes
        .iter_mut()
        .filter_map(|o| o.get_mut("actual"))
        .filter_map(Value::as_object_mut)
    {
        if actual.get("used_total_load_kg").is_some_and(Value::is_number) {
            continue;
        }
        let added = actual
            .get("used_added_weight_kg")
            .or_else(|| actual.get("added_weight_kg"))
            .filter(|v| !v.is_null());
        let assistance = actual
            .get("used_assistance_kg")
            .or_else(|| actual.get("assistance_kg"))
            .filter(|v| !v.is_null());
        if added.is_none() && assistance.is_none() {
            continue;
        }
        let added = added.and_then(Value::as_f64).unwrap_or(0.0);
        let assistance = assistance.and_then(Value::as_f64).unwrap_or(0.0);
        let total = round2(bodyweight + added - assistance);
        actual.insert("used_total_load_kg".to_owned(), Value::from(total));
    }
}

fn non_empty_str(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToOwned::to_owned)
}

/// Structural problems of a normalized entry; empty when the entry is valid
#[must_use]
pub fn validate_entry(entry: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if !non_empty_str(entry.get("user").filter(|u| u.is_object()).and_then(|u| u.get("id"))) {
        errors.push("Missing or invalid user.id".to_owned());
    }
    if let Some(date) = entry.get("date") {
        if date.as_str().and_then(parse_date_lenient).is_none() {
            errors.push(format!(
                "Invalid date format: {} (expected YYYY-MM-DD)",
                display_value(date)
            ));
        }
    }

    let outcomes = match entry.get("exercise_outcomes").and_then(Value::as_array) {
        Some(list) if !list.is_empty() => list,
        _ => {
            errors.push("exercise_outcomes must be a non-empty list".to_owned());
            return errors;
        }
    };

    for (i, outcome) in outcomes.iter().enumerate() {
        let Some(outcome) = outcome.as_object() else {
            errors.push(format!("exercise_outcomes[{i}] must be an object"));
            continue;
        };
        if !non_empty_str(outcome.get("exercise_id")) {
            errors.push(format!("exercise_outcomes[{i}].exercise_id missing/empty"));
        }
        if !outcome.contains_key("planned") {
            errors.push(format!("exercise_outcomes[{i}].planned missing"));
        }
        match outcome.get("actual") {
            None | Some(Value::Null) => {}
            Some(Value::Object(actual)) => {
                let status = actual
                    .get("status")
                    .cloned()
                    .unwrap_or_else(|| Value::String("planned".to_owned()));
                if !status.as_str().is_some_and(|s| OUTCOME_STATUSES.contains(&s)) {
                    errors.push(format!(
                        "exercise_outcomes[{i}].actual.status invalid: {}",
                        display_value(&status)
                    ));
                }
            }
            Some(_) => errors.push(format!(
                "exercise_outcomes[{i}].actual must be an object if present"
            )),
        }
    }
    errors
}

/// Run an entry through the full pipeline and persist it
///
/// The entry lands in exactly one place: the per-year log of its `date`
/// (or of `today` when it has none), the rejected log, or the legacy log.
///
/// # Errors
///
/// Returns a storage error when the target file cannot be written
pub fn append_entry(
    log: &SessionLog,
    mut entry: Value,
    state_bodyweight: Option<f64>,
    today: NaiveDate,
) -> AppResult<AppendOutcome> {
    if let Some(reason) = legacy_reason(&entry) {
        let path = log.quarantine_legacy(&entry, &reason)?;
        return Ok(AppendOutcome::Legacy { path, reason });
    }

    normalize(&mut entry);
    let bodyweight = entry_bodyweight(&entry, state_bodyweight);
    autofill_total_load(&mut entry, bodyweight);

    let errors = validate_entry(&entry);
    if !errors.is_empty() {
        debug!(?errors, "session log entry failed validation");
        let path = log.reject(&entry, &errors)?;
        return Ok(AppendOutcome::Rejected { path, errors });
    }

    let date = entry
        .get("date")
        .and_then(Value::as_str)
        .and_then(parse_date_lenient)
        .unwrap_or(today);
    let path = log.append(date, &entry)?;
    info!(%date, "session log entry accepted");
    Ok(AppendOutcome::Appended { path })
}

/// Result of checking every line of a JSONL file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonlReport {
    /// Non-blank lines
    pub total: usize,
    /// Lines with at least one problem
    pub invalid: usize,
    /// `<file>:<line>: <problem>` descriptions
    pub problems: Vec<String>,
}

impl JsonlReport {
    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        if self.invalid == 0 {
            format!("SUMMARY: {} entries OK", self.total)
        } else {
            format!("SUMMARY: {}/{} invalid", self.invalid, self.total)
        }
    }

    /// Process exit code
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.invalid == 0 {
            EXIT_OK
        } else {
            EXIT_INVALID
        }
    }
}

impl fmt::Display for JsonlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for problem in &self.problems {
            writeln!(f, "{problem}")?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Check every line of an existing session log without modifying it
///
/// # Errors
///
/// Returns not-found when the file does not exist and a storage error when it
/// cannot be read
pub fn validate_jsonl(path: &Path) -> AppResult<JsonlReport> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::not_found(format!("Log file {}", path.display())).with_source(e)
    })?;

    let mut report = JsonlReport::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        report.total += 1;
        let at = format!("{}:{}", path.display(), index + 1);

        let entry = match serde_json::from_str::<Value>(line) {
            Ok(entry) if entry.is_object() => entry,
            Ok(_) => {
                report.invalid += 1;
                report.problems.push(format!("{at}: INVALID (line is not an object)"));
                continue;
            }
            Err(e) => {
                report.invalid += 1;
                report.problems.push(format!("{at}: INVALID JSON ({e})"));
                continue;
            }
        };

        let mut errors: Vec<String> = legacy_reason(&entry).into_iter().collect();
        let mut normalized = entry;
        normalize(&mut normalized);
        errors.extend(validate_entry(&normalized));
        if !errors.is_empty() {
            report.invalid += 1;
            report
                .problems
                .push(format!("{at}: INVALID ({} errors)", errors.len()));
            report
                .problems
                .extend(errors.into_iter().map(|e| format!("- {e}")));
        }
    }
    Ok(report)
}
