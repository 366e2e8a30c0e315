// ABOUTME: Outdoor climbing day log with validation, per-year JSONL storage, and summary statistics
// ABOUTME: Stats cover route counts, a grade histogram, onsight/flash/send rates, and the hardest send
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crux_core::dates::{parse_date_lenient, DATE_FORMAT};
use crux_core::errors::{AppError, AppResult, ErrorCode};
use crux_core::grades::Grade;
use crux_core::models::{OutdoorSession, OUTDOOR_LOG_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::storage::jsonl;

/// File name prefix of the per-year outdoor logs
pub const OUTDOOR_LOG_PREFIX: &str = "outdoor_sessions_";

const REQUIRED_FIELDS: [&str; 6] = [
    "date",
    "discipline",
    "duration_minutes",
    "log_version",
    "routes",
    "spot_name",
];

const DISCIPLINES: [&str; 3] = ["lead", "boulder", "both"];

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Problems with an outdoor entry; empty when it is valid
///
/// Missing required fields are reported alone, without further checks.
#[must_use]
pub fn validate_outdoor_entry(entry: &Value) -> Vec<String> {
    let Some(map) = entry.as_object() else {
        return vec![format!("Missing required fields: {REQUIRED_FIELDS:?}")];
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !map.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return vec![format!("Missing required fields: {missing:?}")];
    }

    let mut errors = Vec::new();
    if map.get("log_version").and_then(Value::as_str) != Some(OUTDOOR_LOG_VERSION) {
        errors.push(format!(
            "Invalid log_version: {} (expected {OUTDOOR_LOG_VERSION})",
            display_value(map.get("log_version"))
        ));
    }
    if !map
        .get("discipline")
        .and_then(Value::as_str)
        .is_some_and(|d| DISCIPLINES.contains(&d))
    {
        errors.push(format!(
            "Invalid discipline: {}",
            display_value(map.get("discipline"))
        ));
    }
    let date_ok = map
        .get("date")
        .and_then(Value::as_str)
        .is_some_and(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).is_ok());
    if !date_ok {
        errors.push(format!(
            "Invalid date format: {} (expected YYYY-MM-DD)",
            display_value(map.get("date"))
        ));
    }
    if !map
        .get("duration_minutes")
        .and_then(Value::as_i64)
        .is_some_and(|minutes| minutes >= 1)
    {
        errors.push(format!(
            "Invalid duration_minutes: {}",
            display_value(map.get("duration_minutes"))
        ));
    }

    match map.get("routes").and_then(Value::as_array) {
        None => errors.push("routes must be a list".to_owned()),
        Some(routes) => {
            for (i, route) in routes.iter().enumerate() {
                let Some(route) = route.as_object() else {
                    errors.push(format!("routes[{i}] must be a dict"));
                    continue;
                };
                if !truthy(route.get("name")) {
                    errors.push(format!("routes[{i}].name is required"));
                }
                if !truthy(route.get("grade")) {
                    errors.push(format!("routes[{i}].grade is required"));
                }
                if !route
                    .get("attempts")
                    .and_then(Value::as_array)
                    .is_some_and(|a| !a.is_empty())
                {
                    errors.push(format!("routes[{i}].attempts must be a non-empty list"));
                }
            }
        }
    }
    errors
}

/// The outdoor logs of one directory
#[derive(Debug, Clone)]
pub struct OutdoorLog {
    dir: PathBuf,
}

impl OutdoorLog {
    /// Logs under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Log directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate an entry and append it to the file of its year
    ///
    /// # Errors
    ///
    /// Returns a `SchemaRejected` error listing every problem when the entry
    /// is invalid (nothing is written), and a storage error when the file
    /// cannot be written
    pub fn append(&self, entry: &Value) -> AppResult<PathBuf> {
        let errors = validate_outdoor_entry(entry);
        if !errors.is_empty() {
            return Err(AppError::new(
                ErrorCode::SchemaRejected,
                format!("Invalid outdoor session entry: {}", errors.join("; ")),
            )
            .with_details(json!({ "errors": errors })));
        }
        let session: OutdoorSession = serde_json::from_value(entry.clone()).map_err(|e| {
            AppError::new(
                ErrorCode::SchemaRejected,
                format!("Invalid outdoor session entry: {e}"),
            )
        })?;

        let path = jsonl::yearly_path(&self.dir, OUTDOOR_LOG_PREFIX, session.date);
        jsonl::append(&path, entry)?;
        info!(
            date = %session.date,
            spot = %session.spot_name,
            routes = session.routes.len(),
            "outdoor session logged"
        );
        Ok(path)
    }

    /// Every readable session dated on or after `since`, in file order
    ///
    /// Lines that are not valid sessions are skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the directory or a file cannot be read
    pub fn load(&self, since: Option<NaiveDate>) -> AppResult<Vec<OutdoorSession>> {
        let mut sessions = Vec::new();
        for path in jsonl::yearly_files(&self.dir, OUTDOOR_LOG_PREFIX)? {
            for value in jsonl::read_values(&path)? {
                match serde_json::from_value::<OutdoorSession>(value) {
                    Ok(session) if since.is_some_and(|s| session.date < s) => {}
                    Ok(session) => sessions.push(session),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable outdoor session"),
                }
            }
        }
        Ok(sessions)
    }

    /// Stats over the sessions since `since` (inclusive)
    ///
    /// # Errors
    ///
    /// Returns a storage error when the logs cannot be read
    pub fn stats(&self, since: Option<NaiveDate>) -> AppResult<OutdoorStats> {
        Ok(OutdoorStats::from_sessions(&self.load(since)?))
    }
}

/// Parse an optional `since` filter
///
/// # Errors
///
/// Returns an invalid-format error when the value is not `YYYY-MM-DD`
pub fn parse_since(raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    raw.map(|s| {
        parse_date_lenient(s).ok_or_else(|| {
            AppError::invalid_format(format!("Invalid date format: {s} (expected YYYY-MM-DD)"))
        })
    })
    .transpose()
}

/// Aggregates over outdoor sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorStats {
    /// Sessions counted
    pub total_sessions: usize,
    /// Routes tried across all sessions
    pub total_routes: usize,
    /// Routes per grade label, sorted by label
    pub grade_histogram: BTreeMap<String, usize>,
    /// Share of routes onsighted, percent with one decimal
    pub onsight_pct: f64,
    /// Share of routes flashed, percent with one decimal
    pub flash_pct: f64,
    /// Share of routes sent, percent with one decimal
    pub sent_pct: f64,
    /// Hardest grade sent
    pub top_grade_sent: Option<String>,
}

/// Rank of a sent grade: ladder grades by sport-equivalent index, unknown labels below them
fn grade_rank(raw: &str) -> (Option<usize>, &str) {
    (
        Grade::parse(raw)
            .ok()
            .map(|g| g.to_sport_equivalent().index()),
        raw,
    )
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

impl OutdoorStats {
    /// Compute the aggregates
    ///
    /// A route counts as sent when any attempt is a send. Style `onsight` and
    /// `flash` count as such; a send with no style and a single attempt counts
    /// as an onsight.
    #[must_use]
    pub fn from_sessions(sessions: &[OutdoorSession]) -> Self {
        let mut total_routes = 0;
        let mut onsight = 0;
        let mut flash = 0;
        let mut sent = 0;
        let mut grade_histogram = BTreeMap::new();
        let mut top: Option<&str> = None;

        for route in sessions.iter().flat_map(|s| &s.routes) {
            total_routes += 1;
            *grade_histogram.entry(route.grade.clone()).or_insert(0) += 1;

            if !route.attempts.iter().any(|a| a.is_send()) {
                continue;
            }
            sent += 1;
            let harder = match top {
                Some(best) => grade_rank(&route.grade) > grade_rank(best),
                None => true,
            };
            if harder {
                top = Some(&route.grade);
            }
            match route.style.as_deref() {
                Some("onsight") => onsight += 1,
                Some("flash") => flash += 1,
                None if route.attempts.len() == 1 => onsight += 1,
                _ => {}
            }
        }

        Self {
            total_sessions: sessions.len(),
            total_routes,
            grade_histogram,
            onsight_pct: percent(onsight, total_routes),
            flash_pct: percent(flash, total_routes),
            sent_pct: percent(sent, total_routes),
            top_grade_sent: top.map(ToOwned::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(date: &str, routes: Value) -> Value {
        json!({
            "log_version": "outdoor.v1",
            "date": date,
            "spot_name": "Siurana",
            "discipline": "lead",
            "duration_minutes": 240,
            "routes": routes
        })
    }

    #[test]
    fn test_missing_fields_reported_alone() {
        let errors = validate_outdoor_entry(&json!({"date": "nope", "routes": 3}));
        assert_eq!(
            errors,
            ["Missing required fields: [\"discipline\", \"duration_minutes\", \"log_version\", \"spot_name\"]"]
        );
    }

    #[test]
    fn test_field_checks() {
        let mut bad = entry("2026-13-01", json!([{"name": "", "attempts": []}, 4]));
        bad["log_version"] = json!("outdoor.v0");
        bad["discipline"] = json!("trad");
        bad["duration_minutes"] = json!(0);
        assert_eq!(
            validate_outdoor_entry(&bad),
            [
                "Invalid log_version: outdoor.v0 (expected outdoor.v1)",
                "Invalid discipline: trad",
                "Invalid date format: 2026-13-01 (expected YYYY-MM-DD)",
                "Invalid duration_minutes: 0",
                "routes[0].name is required",
                "routes[0].grade is required",
                "routes[0].attempts must be a non-empty list",
                "routes[1] must be a dict"
            ]
        );

        let mut not_list = entry("2026-05-01", json!({}));
        not_list["duration_minutes"] = json!(90.5);
        assert_eq!(
            validate_outdoor_entry(&not_list),
            ["Invalid duration_minutes: 90.5", "routes must be a list"]
        );
    }

    #[test]
    fn test_append_rejects_without_writing() {
        let dir = TempDir::new().unwrap();
        let log = OutdoorLog::new(dir.path());
        let err = log.append(&entry("2026-05-01", json!("x"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaRejected);
        assert!(jsonl::yearly_files(dir.path(), OUTDOOR_LOG_PREFIX)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_load_filters_by_since() {
        let dir = TempDir::new().unwrap();
        let log = OutdoorLog::new(dir.path());
        let routes = json!([{"name": "A", "grade": "7a", "attempts": [{"result": "sent"}]}]);
        let path = log.append(&entry("2025-11-02", routes.clone())).unwrap();
        assert!(path.ends_with("outdoor_sessions_2025.jsonl"));
        log.append(&entry("2026-03-15", routes)).unwrap();

        assert_eq!(log.load(None).unwrap().len(), 2);
        let since = parse_since(Some("2026-01-01")).unwrap();
        let recent = log.load(since).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].date.to_string(), "2026-03-15");
        assert!(parse_since(Some("January")).is_err());
    }

    #[test]
    fn test_stats() {
        let sessions: Vec<OutdoorSession> = [
            entry(
                "2026-04-01",
                json!([
                    {"name": "A", "grade": "7a", "style": "onsight", "attempts": [{"result": "sent"}]},
                    {"name": "B", "grade": "7b+", "attempts": [{"result": "fell"}, {"result": "sent"}]},
                    {"name": "C", "grade": "8a", "attempts": [{"result": "fell"}]}
                ]),
            ),
            entry(
                "2026-04-02",
                json!([
                    {"name": "D", "grade": "6c+", "attempts": [{"result": "sent"}]},
                    {"name": "E", "grade": "7a", "style": "flash", "attempts": [{"result": "sent"}]},
                    {"name": "F", "grade": "10z", "attempts": [{"result": "sent"}]}
                ]),
            ),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect();

        let stats = OutdoorStats::from_sessions(&sessions);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_routes, 6);
        assert_eq!(
            stats.grade_histogram.keys().collect::<Vec<_>>(),
            ["10z", "6c+", "7a", "7b+", "8a"]
        );
        assert_eq!(stats.grade_histogram["7a"], 2);
        // A onsight, D and F single-attempt sends
        assert!((stats.onsight_pct - 50.0).abs() < f64::EPSILON);
        assert!((stats.flash_pct - 16.7).abs() < f64::EPSILON);
        assert!((stats.sent_pct - 83.3).abs() < f64::EPSILON);
        assert_eq!(stats.top_grade_sent.as_deref(), Some("7b+"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = OutdoorStats::from_sessions(&[]);
        assert_eq!(stats.total_sessions, 0);
        assert!(stats.grade_histogram.is_empty());
        assert!(stats.sent_pct.abs() < f64::EPSILON);
        assert!(stats.top_grade_sent.is_none());
    }
}
