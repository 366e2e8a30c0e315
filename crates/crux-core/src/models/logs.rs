// ABOUTME: Session log records: resolved days, closed-loop log entries, per-exercise feedback
// ABOUTME: Outdoor climbing session records with routes and attempts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::catalog::{tag_is_set, Prescription};
use super::common::{FeedbackLabel, Location, SessionStatus};
use super::resolved::SuggestedTargets;
use super::user_state::StimulusCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version tag of closed-loop log entries
pub const CLOSED_LOOP_LOG_VERSION: &str = "closed_loop.v1";
/// Schema version accepted by the session log validator
pub const SESSION_LOG_SCHEMA_VERSION: &str = "session_log_entry.v1";
/// Version tag of outdoor log entries
pub const OUTDOOR_LOG_VERSION: &str = "outdoor.v1";

/// An exercise instance as carried by a logged day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedInstance {
    /// Exercise id
    #[serde(default)]
    pub exercise_id: String,
    /// Prescription shown to the user
    #[serde(default)]
    pub prescription: Prescription,
    /// Targets that were suggested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<SuggestedTargets>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A session of a logged day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySession {
    /// Session id
    #[serde(default)]
    pub session_id: String,
    /// Session intent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Session tags
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tags: Value,
    /// Where it took place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Gym, when at the gym
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
    /// Resolved exercises
    #[serde(default)]
    pub exercise_instances: Vec<PlannedInstance>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DaySession {
    /// Whether the tag is set
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        tag_is_set(&self.tags, tag)
    }

    /// Intent, lowercased and trimmed
    #[must_use]
    pub fn intent_key(&self) -> String {
        self.intent
            .as_deref()
            .map(|i| i.trim().to_lowercase())
            .unwrap_or_default()
    }

    /// Whether this is a benchmark test session
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.session_id.starts_with("test_") || self.has_tag("test")
    }

    /// Stimulus categories this session trains
    #[must_use]
    pub fn categories(&self) -> Vec<StimulusCategory> {
        let sid = self.session_id.as_str();
        let intent = self.intent_key();
        let mut categories = Vec::new();
        if self.has_tag("finger") || sid.contains("finger") || intent == "strength" {
            categories.push(StimulusCategory::FingerStrength);
        }
        if sid.contains("power") || intent == "power" {
            categories.push(StimulusCategory::BoulderPower);
        }
        if sid.contains("endurance")
            || matches!(
                intent.as_str(),
                "aerobic_endurance" | "power_endurance" | "endurance"
            )
        {
            categories.push(StimulusCategory::Endurance);
        }
        if categories.is_empty()
            || sid.contains("technique")
            || matches!(intent.as_str(), "accessory" | "recovery" | "technique")
        {
            categories.push(StimulusCategory::Complementaries);
        }
        categories.sort();
        categories.dedup();
        categories
    }
}

/// Reference to the plan a day came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef {
    /// Plan version
    #[serde(default)]
    pub plan_version: Option<String>,
    /// Plan start date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// A day of resolved sessions, the unit the closed loop records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDay {
    /// Calendar date
    pub date: NaiveDate,
    /// Sessions of the day
    #[serde(default)]
    pub sessions: Vec<DaySession>,
    /// Owning plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanRef>,
    /// Pointer to the stored resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ref: Option<String>,
}

impl ResolvedDay {
    /// Union of the categories of every session, sorted
    #[must_use]
    pub fn categories(&self) -> Vec<StimulusCategory> {
        let mut all: Vec<StimulusCategory> =
            self.sessions.iter().flat_map(DaySession::categories).collect();
        all.sort();
        all.dedup();
        all
    }
}

/// Per-exercise feedback as reported by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseFeedback {
    /// Exercise id
    #[serde(default)]
    pub exercise_id: String,
    /// Canonical label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_label: Option<String>,
    /// Legacy difficulty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Legacy difficulty label, alternate key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_label: Option<String>,
    /// Legacy flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_hard: Option<bool>,
    /// Legacy flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<bool>,
    /// Whether the prescription was completed
    #[serde(default)]
    pub completed: bool,
    /// Total load used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_total_load_kg: Option<f64>,
    /// Added load used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_external_load_kg: Option<f64>,
    /// Font grade climbed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_grade: Option<String>,
    /// Board or wall used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_selected: Option<String>,
    /// Remaining fields (setup overrides such as `edge_mm`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExerciseFeedback {
    /// Canonical label: explicit label, then legacy difficulty, then legacy
    /// failure flags, else `ok`
    #[must_use]
    pub fn label(&self) -> FeedbackLabel {
        const CANONICAL: [&str; 5] = ["very_easy", "easy", "ok", "hard", "very_hard"];
        if let Some(raw) = self.feedback_label.as_deref() {
            let raw = raw.trim().to_lowercase();
            if CANONICAL.contains(&raw.as_str()) {
                if let Some(label) = FeedbackLabel::parse_lenient(&raw) {
                    return label;
                }
            }
        }
        let legacy = self
            .difficulty
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.difficulty_label.as_deref());
        if let Some(label) = legacy.and_then(FeedbackLabel::parse_lenient) {
            return label;
        }
        if self.too_hard.unwrap_or(false) || self.fail.unwrap_or(false) {
            return FeedbackLabel::VeryHard;
        }
        FeedbackLabel::Ok
    }
}

/// What actually happened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualOutcome {
    /// Per-exercise feedback
    #[serde(default)]
    pub exercise_feedback_v1: Vec<ExerciseFeedback>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Summary block of a closed-loop entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    /// Number of sessions
    pub session_count: usize,
    /// Day status
    pub status: SessionStatus,
    /// Stimulus categories trained
    pub categories: Vec<StimulusCategory>,
    /// Session ids in order
    pub session_ids: Vec<String>,
}

/// A closed-loop session log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// Schema version, when written by a validating producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Log format version
    #[serde(default = "closed_loop_version")]
    pub log_version: String,
    /// Day of the sessions
    pub date: NaiveDate,
    /// `done` or `skipped`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    /// Version of the plan the day came from
    #[serde(default)]
    pub plan_version: Option<String>,
    /// Start date of that plan
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Location of the first session
    #[serde(default)]
    pub location: Option<Location>,
    /// Gym of the first session
    #[serde(default)]
    pub gym_id: Option<String>,
    /// Session ids in order
    #[serde(default)]
    pub session_ids: Vec<String>,
    /// Pointer to the stored resolution
    #[serde(default)]
    pub resolved_ref: Option<String>,
    /// Sessions as planned
    #[serde(default)]
    pub planned: Vec<DaySession>,
    /// What happened
    #[serde(default)]
    pub actual: ActualOutcome,
    /// Free text
    #[serde(default)]
    pub notes: String,
    /// Summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LogSummary>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn closed_loop_version() -> String {
    CLOSED_LOOP_LOG_VERSION.to_owned()
}

impl SessionLogEntry {
    /// Per-exercise feedback items
    #[must_use]
    pub fn feedback(&self) -> &[ExerciseFeedback] {
        &self.actual.exercise_feedback_v1
    }

    /// First planned session carrying an instance of the exercise
    #[must_use]
    pub fn planned_instance(&self, exercise_id: &str) -> Option<(&DaySession, &PlannedInstance)> {
        self.planned.iter().find_map(|session| {
            session
                .exercise_instances
                .iter()
                .find(|inst| inst.exercise_id == exercise_id)
                .map(|inst| (session, inst))
        })
    }

    /// Whether any planned session is a benchmark test
    #[must_use]
    pub fn is_test_day(&self) -> bool {
        self.planned.iter().any(DaySession::is_test)
    }
}

/// Outdoor discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutdoorDiscipline {
    /// Routes
    Lead,
    /// Boulders
    Boulder,
    /// Both on the same day
    Both,
}

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdoorAttempt {
    /// `sent`, `fell`, `topped_out`
    #[serde(default)]
    pub result: Option<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutdoorAttempt {
    /// Whether the attempt was a send
    #[must_use]
    pub fn is_send(&self) -> bool {
        self.result.as_deref() == Some("sent")
    }
}

/// A route or boulder tried during an outdoor session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdoorRoute {
    /// Route name
    pub name: String,
    /// Grade as written in the guidebook
    pub grade: String,
    /// Lead or boulder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline: Option<String>,
    /// `onsight`, `flash`, `redpoint`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Attempts in order
    #[serde(default)]
    pub attempts: Vec<OutdoorAttempt>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An outdoor climbing day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorSession {
    /// Version tag
    pub log_version: String,
    /// Day
    pub date: NaiveDate,
    /// Crag or area
    pub spot_name: String,
    /// Discipline
    pub discipline: OutdoorDiscipline,
    /// Time on rock
    pub duration_minutes: u32,
    /// Routes tried
    pub routes: Vec<OutdoorRoute>,
    /// Weather and rock conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    /// Free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Self-rated energy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<Value>,
    /// Self-rated feeling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_feeling: Option<Value>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feedback_label_precedence() {
        let item: ExerciseFeedback =
            serde_json::from_value(json!({"exercise_id": "x", "feedback_label": "hard"})).unwrap();
        assert_eq!(item.label(), FeedbackLabel::Hard);

        let legacy: ExerciseFeedback =
            serde_json::from_value(json!({"exercise_id": "x", "difficulty": "too_easy"})).unwrap();
        assert_eq!(legacy.label(), FeedbackLabel::VeryEasy);

        let flagged: ExerciseFeedback =
            serde_json::from_value(json!({"exercise_id": "x", "fail": true})).unwrap();
        assert_eq!(flagged.label(), FeedbackLabel::VeryHard);

        let bogus: ExerciseFeedback =
            serde_json::from_value(json!({"exercise_id": "x", "feedback_label": "fail"})).unwrap();
        assert_eq!(bogus.label(), FeedbackLabel::Ok);
    }

    #[test]
    fn test_session_categories() {
        let session = |sid: &str, intent: Option<&str>, tags: Value| DaySession {
            session_id: sid.into(),
            intent: intent.map(Into::into),
            tags,
            ..DaySession::default()
        };
        assert_eq!(
            session("finger_strength_home", None, json!({"finger": true})).categories(),
            [StimulusCategory::FingerStrength]
        );
        assert_eq!(
            session("power_endurance_gym", None, Value::Null).categories(),
            [StimulusCategory::BoulderPower, StimulusCategory::Endurance]
        );
        assert_eq!(
            session("technique_focus_gym", Some("technique"), Value::Null).categories(),
            [StimulusCategory::Complementaries]
        );
        assert_eq!(
            session("strength_long", Some("strength"), Value::Null).categories(),
            [StimulusCategory::FingerStrength]
        );
    }

    #[test]
    fn test_planned_instance_lookup() {
        let entry: SessionLogEntry = serde_json::from_value(json!({
            "date": "2026-01-05",
            "planned": [{
                "session_id": "test_max_hang_5s",
                "gym_id": "blocx",
                "exercise_instances": [{"exercise_id": "max_hang_5s", "prescription": {"edge_mm": 20}}]
            }]
        }))
        .unwrap();
        let (session, inst) = entry.planned_instance("max_hang_5s").unwrap();
        assert_eq!(session.gym_id.as_deref(), Some("blocx"));
        assert_eq!(inst.prescription["edge_mm"], 20);
        assert!(entry.is_test_day());
        assert_eq!(entry.log_version, CLOSED_LOOP_LOG_VERSION);
    }
}
