// ABOUTME: Assessment inputs (body, experience, grades, tests, self-evaluation) and the 6-axis profile
// ABOUTME: Goal record with discipline and target/current grades
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const fn neutral_score() -> u8 {
    50
}

/// Six-axis climber profile, each score in `0..=100`
///
/// Axes missing from stored JSON read as the neutral score 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentProfile {
    /// Max-hang capacity relative to the goal benchmark
    #[serde(default = "neutral_score")]
    pub finger_strength: u8,
    /// Weighted pull capacity relative to the goal benchmark
    #[serde(default = "neutral_score")]
    pub pulling_strength: u8,
    /// Pump tolerance, from the redpoint/onsight gap
    #[serde(default = "neutral_score")]
    pub power_endurance: u8,
    /// Movement skill, from the redpoint/onsight gap
    #[serde(default = "neutral_score")]
    pub technique: u8,
    /// Aerobic capacity
    #[serde(default = "neutral_score")]
    pub endurance: u8,
    /// Strength-to-weight proxy
    #[serde(default = "neutral_score")]
    pub body_composition: u8,
}

impl Default for AssessmentProfile {
    fn default() -> Self {
        Self {
            finger_strength: neutral_score(),
            pulling_strength: neutral_score(),
            power_endurance: neutral_score(),
            technique: neutral_score(),
            endurance: neutral_score(),
            body_composition: neutral_score(),
        }
    }
}

/// One axis of the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Finger strength
    FingerStrength,
    /// Pulling strength
    PullingStrength,
    /// Power endurance
    PowerEndurance,
    /// Technique
    Technique,
    /// Endurance
    Endurance,
    /// Body composition
    BodyComposition,
}

impl AssessmentProfile {
    /// Score on one axis
    #[must_use]
    pub const fn score(&self, axis: Axis) -> u8 {
        match axis {
            Axis::FingerStrength => self.finger_strength,
            Axis::PullingStrength => self.pulling_strength,
            Axis::PowerEndurance => self.power_endurance,
            Axis::Technique => self.technique,
            Axis::Endurance => self.endurance,
            Axis::BodyComposition => self.body_composition,
        }
    }
}

/// Body metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMetrics {
    /// Bodyweight in kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Height in centimetres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Body fat percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    /// Fields this version does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Climbing background
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    /// Years of climbing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climbing_years: Option<f64>,
    /// Fields this version does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Self-reported best grades
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedGrades {
    /// Hardest lead redpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_max_rp: Option<String>,
    /// Hardest lead onsight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_max_os: Option<String>,
    /// Hardest boulder redpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boulder_max_rp: Option<String>,
    /// Hardest boulder flash/onsight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boulder_max_os: Option<String>,
}

/// Strength test results, totals include bodyweight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    /// Max hang, 20 mm edge, 5 seconds, total kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hang_20mm_5s_total_kg: Option<f64>,
    /// Weighted pull-up one-rep max, total kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_pullup_1rm_total_kg: Option<f64>,
    /// Fields this version does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Self-evaluated limiters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEvaluation {
    /// Main limiter id (`fingers_give_out`, `pump_too_early`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_weakness: Option<String>,
    /// Second limiter id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_weakness: Option<String>,
}

impl SelfEvaluation {
    /// Penalty for a weakness matching any of `ids`: `primary` when it is the
    /// primary weakness, `secondary` when it is the secondary one, else 0
    #[must_use]
    pub fn penalty(&self, ids: &[&str], primary: f64, secondary: f64) -> f64 {
        let matches = |w: &Option<String>| w.as_deref().is_some_and(|w| ids.contains(&w));
        if matches(&self.primary_weakness) {
            primary
        } else if matches(&self.secondary_weakness) {
            secondary
        } else {
            0.0
        }
    }
}

/// Everything the assessment engine reads, as stored under `assessment`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInputs {
    /// Body metrics
    #[serde(default)]
    pub body: BodyMetrics,
    /// Climbing background
    #[serde(default)]
    pub experience: Experience,
    /// Best grades
    #[serde(default)]
    pub grades: ReportedGrades,
    /// Strength tests
    #[serde(default)]
    pub tests: TestResults,
    /// Self-evaluation
    #[serde(default)]
    pub self_eval: SelfEvaluation,
    /// Last computed profile
    #[serde(default)]
    pub profile: Option<AssessmentProfile>,
    /// Date of the last computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assessed: Option<String>,
}

/// Goal discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// Roped sport climbing
    Lead,
    /// Bouldering
    Boulder,
}

/// Training goal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Free-form goal kind (`lead_grade`, `boulder_grade`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
    /// Lead or boulder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline: Option<Discipline>,
    /// Grade to reach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_grade: Option<String>,
    /// Grade climbed today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_grade: Option<String>,
    /// Redpoint, onsight, flash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_style: Option<String>,
    /// Target date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Goal {
    /// Whether any goal field is set
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.target_grade.is_some() || self.goal_type.is_some() || self.current_grade.is_some()
    }
}
