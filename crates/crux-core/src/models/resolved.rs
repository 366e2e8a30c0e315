// ABOUTME: Resolved session instances: per-block selection results, filter traces, exercise instances
// ABOUTME: Suggested load and grade targets attached to instances by the progression engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::catalog::Prescription;
use super::common::Location;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Format tag of a resolved session instance
pub const SESSION_INSTANCE_VERSION: &str = "1.1";
/// Resolver version written into every instance
pub const RESOLVER_VERSION: &str = "0.3";
/// Format tag of injected suggestions
pub const TARGETS_SCHEMA_VERSION: &str = "progression_targets.v1";
/// Format tag of boulder grade targets
pub const BOULDER_TARGET_SCHEMA_VERSION: &str = "boulder_grade_font_v0";

/// Outcome of a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    /// At least one exercise selected, or instruction-only
    Selected,
    /// No candidate survived the filters
    Skipped,
    /// Resolution error (unknown explicit exercise, missing role)
    Failed,
}

/// Outcome of the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    /// No required block failed
    Success,
    /// Some required block failed, others selected
    Partial,
    /// Every required block failed
    Failed,
}

/// Where a resolution ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveContext {
    /// Effective location
    pub location: Location,
    /// Effective gym
    pub gym_id: Option<String>,
    /// Day the session is planned for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// Equipment reachable at the location
    pub available_equipment: Vec<String>,
}

/// Session identity inside an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Session id
    pub session_id: String,
    /// Session version
    pub session_version: String,
    /// Session intent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Session tags
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tags: Value,
}

/// Module as it was expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// Template id, absent for inline blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Template version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Inline block id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_block_id: Option<String>,
}

/// Candidate counts recorded at each filter stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTrace {
    /// Pipeline stage label
    pub p_stage: String,
    /// Candidate count after each stage
    pub counts: BTreeMap<String, usize>,
    /// Whether the domain filter narrowed the set
    pub domain_filter_applied: Option<bool>,
    /// `primary` or `fallback[i]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_source: Option<String>,
    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Error message for failed blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Exercise picked for a block, with its merged prescription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedExercise {
    /// Exercise id
    pub exercise_id: String,
    /// Final prescription
    pub prescription: Prescription,
}

/// Resolution result for one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBlock {
    /// `template.block`
    pub block_uid: String,
    /// Block id
    pub block_id: String,
    /// Block type
    #[serde(rename = "type")]
    pub block_type: String,
    /// Owning template, absent for inline blocks
    pub template_id: Option<String>,
    /// Whether the block counts towards the session status
    pub required: bool,
    /// Outcome
    pub status: BlockStatus,
    /// Explanation for non-selected outcomes
    pub message: Option<String>,
    /// Instruction text for instruction-only blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Map<String, Value>>,
    /// Stage counts
    pub filter_trace: FilterTrace,
    /// Picked exercises
    pub selected_exercises: Vec<SelectedExercise>,
}

/// Provenance of an exercise instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSource {
    /// `resolver/<rule>`
    pub picked_by: String,
    /// Owning template
    pub template_id: Option<String>,
    /// Owning block
    pub block_id: String,
}

/// Cluster cooldown adjustment made while resolving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownNote {
    /// Cluster under cooldown
    pub cooldown_cluster: String,
    /// Last day of the cooldown
    pub until_date: NaiveDate,
    /// Substitute exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_exercise_id: Option<String>,
    /// `cluster_cooldown_fallback` or `cluster_cooldown_downshift`
    pub reason: String,
    /// Load multiplier for downshifts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

/// Boulder grade target for grade-based exercises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoulderTarget {
    /// Format tag
    pub schema_version: String,
    /// Surfaces available at the gym in priority order
    pub surface_options: Vec<String>,
    /// Surface to use
    pub surface_selected: String,
    /// Font grade to aim for
    pub target_grade: String,
    /// `easy`, `medium` or `hard`
    pub intensity_label: String,
}

/// Targets injected into an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTargets {
    /// Format tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Bodyweight plus external load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_total_load_kg: Option<f64>,
    /// Added load (negative means assistance)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_external_load_kg: Option<f64>,
    /// `{sets}x{work}s` or `{sets}x{reps}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_rep_scheme: Option<String>,
    /// Edge depth of the setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_mm: Option<u32>,
    /// Grip of the setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grip: Option<String>,
    /// Load method of the setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_method: Option<String>,
    /// Grade target for limit bouldering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_boulder_target: Option<BoulderTarget>,
}

impl SuggestedTargets {
    /// Whether nothing was suggested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A concrete exercise plus its final prescription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInstance {
    /// `{block_id}_{nn}`
    pub instance_id: String,
    /// Exercise id
    pub exercise_id: String,
    /// Merged prescription
    pub prescription: Prescription,
    /// Owning block uid
    pub block_uid: String,
    /// Provenance
    pub source: InstanceSource,
    /// Fatigue cost from the catalog
    #[serde(default)]
    pub fatigue_cost: u32,
    /// Cooldown adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replanner: Option<CooldownNote>,
    /// Progression targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<SuggestedTargets>,
}

/// Expanded body of a resolved session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBody {
    /// Resolver version
    pub resolver_version: String,
    /// Modules in order
    pub modules: Vec<ResolvedModule>,
    /// Blocks in order
    pub blocks: Vec<ResolvedBlock>,
    /// Flat instance list in block order
    pub exercise_instances: Vec<ExerciseInstance>,
}

/// A session resolved to concrete exercises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSession {
    /// Format tag
    pub session_instance_version: String,
    /// Generation timestamp
    pub generated_at: String,
    /// Resolution context
    pub context: ResolveContext,
    /// Session identity
    pub session: SessionIdentity,
    /// Expanded body
    pub resolved_session: ResolvedBody,
    /// Overall outcome
    pub resolution_status: ResolutionStatus,
    /// Sum of fatigue cost over selected exercises
    pub session_load_score: u32,
}

impl ResolvedSession {
    /// Exercise instances in order
    #[must_use]
    pub fn instances(&self) -> &[ExerciseInstance] {
        &self.resolved_session.exercise_instances
    }

    /// Mutable exercise instances
    pub fn instances_mut(&mut self) -> &mut Vec<ExerciseInstance> {
        &mut self.resolved_session.exercise_instances
    }

    /// Block by id
    #[must_use]
    pub fn block(&self, block_id: &str) -> Option<&ResolvedBlock> {
        self.resolved_session
            .blocks
            .iter()
            .find(|b| b.block_id == block_id)
    }
}
