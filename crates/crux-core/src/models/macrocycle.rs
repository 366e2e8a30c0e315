// ABOUTME: Macrocycle records: ordered phases with durations, domain weights, caps, and session pools
// ABOUTME: Trips and their pre-trip deload annotations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::assessment::AssessmentProfile;
use super::common::{DomainWeights, Intensity, PhaseId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A planned climbing trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First day of the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Fields this version does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pre-trip deload annotation on a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PretripDeload {
    /// Trip name
    pub trip_name: Option<String>,
    /// Trip start date
    pub trip_start: NaiveDate,
    /// First day of the deload window
    pub deload_from: NaiveDate,
}

/// One phase of a macrocycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase id
    pub phase_id: PhaseId,
    /// Display name
    pub phase_name: String,
    /// First week, 1-based and inclusive
    pub start_week: u32,
    /// Last week, inclusive
    pub end_week: u32,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Dominant energy system
    pub energy_system: String,
    /// Domain weights summing to 1.0
    pub domain_weights: DomainWeights,
    /// Ordered, deduplicated session ids
    pub session_pool: Vec<String>,
    /// Highest session intensity allowed
    pub intensity_cap: Intensity,
    /// Coaching notes
    pub notes: String,
    /// Trips whose deload window overlaps this phase
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pretrip_deload: Vec<PretripDeload>,
}

/// Goal fields frozen at generation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSnapshot {
    /// Goal kind
    pub goal_type: Option<String>,
    /// Grade to reach
    pub target_grade: Option<String>,
    /// Grade climbed at generation time
    pub current_grade: Option<String>,
    /// Target date
    pub deadline: Option<String>,
}

/// A multi-week periodized program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macrocycle {
    /// Format version (`macrocycle.v1`)
    pub macrocycle_version: String,
    /// Generation timestamp
    pub generated_at: String,
    /// Monday of week 1
    pub start_date: NaiveDate,
    /// Last day of the final week
    pub end_date: NaiveDate,
    /// Goal at generation time
    pub goal_snapshot: GoalSnapshot,
    /// Profile at generation time
    pub assessment_snapshot: AssessmentProfile,
    /// Sum of phase durations
    pub total_weeks: u32,
    /// Phases in canonical order, deload last
    pub phases: Vec<Phase>,
    /// Non-blocking goal warnings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Macrocycle {
    /// Phase with the given id
    #[must_use]
    pub fn phase(&self, phase_id: PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_id == phase_id)
    }
}
