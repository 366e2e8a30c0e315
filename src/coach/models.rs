// ABOUTME: Request and response records exchanged between the coach service and its callers
// ABOUTME: One request/response pair per operation, serialized as the JSON the HTTP layer returns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::errors::{AppError, AppResult};
use crux_core::models::{
    ActualOutcome, AssessmentInputs, AssessmentProfile, AvailabilityInput, Equipment, Exercise,
    Experience, Goal, Location, Macrocycle, OutdoorSession, PhaseId, PlanningPrefs, ReplanEvent, ResolvedDay,
    ResolvedSession, ReportedGrades, SelfEvaluation, SessionLogEntry, SessionSummary, Slot,
    TestResults, Trip, UserState, WeekPlan,
};
use crux_intelligence::replanner::SessionSuggestion;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse a wire-format enum value (`"gym"`, `"evening"`, `"strength"`) from a plain string
///
/// # Errors
///
/// Returns an invalid-input error naming `field` when the value is not recognized
pub fn parse_wire<T: DeserializeOwned>(field: &str, raw: &str) -> AppResult<T> {
    serde_json::from_value(Value::String(raw.trim().to_lowercase()))
        .map_err(|_| AppError::invalid_input(format!("Invalid {field}: {raw}")))
}

const fn default_total_weeks() -> u32 {
    12
}

fn default_status() -> String {
    "done".to_owned()
}

const fn evening() -> Slot {
    Slot::Evening
}

const fn gym() -> Location {
    Location::Gym
}

const fn default_suggestion_limit() -> usize {
    3
}

// ================================================================================================
// State
// ================================================================================================

/// Result of resetting the user state
#[derive(Debug, Clone, Serialize)]
pub struct StateResetResponse {
    /// Always `reset`
    pub status: String,
    /// The empty template now on disk
    pub state: UserState,
}

// ================================================================================================
// Catalog
// ================================================================================================

/// All catalog exercises
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseListResponse {
    /// Exercises sorted by id
    pub exercises: Vec<Exercise>,
    /// Number of exercises
    pub count: usize,
}

/// All catalog sessions without their bodies
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    /// Sessions sorted by id
    pub sessions: Vec<SessionSummary>,
    /// Number of sessions
    pub count: usize,
}

// ================================================================================================
// Assessment and macrocycle
// ================================================================================================

/// Inputs for an assessment; omitted parts come from the stored state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentRequest {
    /// Assessment inputs
    #[serde(default)]
    pub assessment: Option<AssessmentInputs>,
    /// Goal
    #[serde(default)]
    pub goal: Option<Goal>,
}

/// Computed profile
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse {
    /// Six-axis profile
    pub profile: AssessmentProfile,
}

/// Macrocycle generation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct MacrocycleGenerateRequest {
    /// Monday of week 1, defaulting to the Monday of the current week
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Total weeks
    #[serde(default = "default_total_weeks")]
    pub total_weeks: u32,
}

impl Default for MacrocycleGenerateRequest {
    fn default() -> Self {
        Self {
            start_date: None,
            total_weeks: default_total_weeks(),
        }
    }
}

/// Generated macrocycle
#[derive(Debug, Clone, Serialize)]
pub struct MacrocycleResponse {
    /// The macrocycle now stored in the state
    pub macrocycle: Macrocycle,
}

// ================================================================================================
// Week and resolution
// ================================================================================================

/// A planned week with every session resolved inline
#[derive(Debug, Clone, Serialize)]
pub struct WeekResponse {
    /// Absolute week number, 1-based
    pub week_num: u32,
    /// Phase of the week
    pub phase_id: PhaseId,
    /// The plan
    pub week_plan: WeekPlan,
}

/// Where and when a session is resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Location, defaulting to the session's own
    #[serde(default)]
    pub location: Option<Location>,
    /// Gym, defaulting to the session's own or the preferred gym
    #[serde(default)]
    pub gym_id: Option<String>,
    /// Day the session is for
    #[serde(default, alias = "date")]
    pub target_date: Option<NaiveDate>,
}

/// Session to resolve
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveSessionRequest {
    /// Catalog session id
    pub session_id: String,
    /// Resolution context
    #[serde(default)]
    pub context: Option<SessionContext>,
}

/// Resolved session
#[derive(Debug, Clone, Serialize)]
pub struct ResolveSessionResponse {
    /// The session with concrete exercises and targets
    pub resolved: ResolvedSession,
}

// ================================================================================================
// Replanning
// ================================================================================================

/// Train a different intent on a day
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    /// Training intent
    pub intent: String,
    /// Location of the new session
    pub location: Location,
    /// Day the user acts from
    pub reference_date: NaiveDate,
    /// Slot of the new session
    #[serde(default = "evening")]
    pub slot: Slot,
    /// Day to override, defaulting to the day after `reference_date`
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    /// Phase override
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    /// Gym for gym sessions
    #[serde(default)]
    pub gym_id: Option<String>,
    /// Plan to change, defaulting to the stored current plan
    #[serde(default)]
    pub week_plan: Option<WeekPlan>,
}

/// Apply replanning events
#[derive(Debug, Clone, Deserialize)]
pub struct EventsRequest {
    /// Events in order
    pub events: Vec<ReplanEvent>,
    /// Plan to change, defaulting to the stored current plan
    #[serde(default)]
    pub week_plan: Option<WeekPlan>,
}

/// Add a session to a free slot
#[derive(Debug, Clone, Deserialize)]
pub struct QuickAddRequest {
    /// Catalog session id
    pub session_id: String,
    /// Day to add to
    #[serde(alias = "date")]
    pub target_date: NaiveDate,
    /// Slot
    #[serde(default = "evening")]
    pub slot: Slot,
    /// Location
    #[serde(default = "gym")]
    pub location: Location,
    /// Phase override
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    /// Gym for gym sessions
    #[serde(default)]
    pub gym_id: Option<String>,
    /// Plan to change, defaulting to the stored current plan
    #[serde(default)]
    pub week_plan: Option<WeekPlan>,
}

/// Updated plan
#[derive(Debug, Clone, Serialize)]
pub struct WeekPlanResponse {
    /// The plan now stored as the current plan
    pub week_plan: WeekPlan,
    /// Non-blocking warnings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Ask for sessions to add on a day
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsRequest {
    /// Day
    #[serde(alias = "target_date")]
    pub date: NaiveDate,
    /// Location the user can train at
    #[serde(default = "gym", alias = "new_location")]
    pub location: Location,
    /// Maximum number of suggestions
    #[serde(default = "default_suggestion_limit")]
    pub limit: usize,
}

/// Ranked session suggestions
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    /// Day
    pub date: NaiveDate,
    /// Location
    pub location: Location,
    /// Best first
    pub suggestions: Vec<SessionSuggestion>,
}

// ================================================================================================
// Feedback and closed loop
// ================================================================================================

/// Feedback for a trained or skipped day
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    /// Log entry with per-exercise feedback
    pub log_entry: SessionLogEntry,
    /// The day as resolved, for stimulus recency and fatigue counters
    #[serde(default)]
    pub resolved_day: Option<ResolvedDay>,
    /// `done` or `skipped`
    #[serde(default = "default_status")]
    pub status: String,
}

/// Close a resolved day from the daily loop
#[derive(Debug, Clone, Deserialize)]
pub struct CloseDayRequest {
    /// The day as resolved
    pub resolved_day: ResolvedDay,
    /// `done` or `skipped`
    #[serde(default = "default_status")]
    pub status: String,
    /// Free text
    #[serde(default)]
    pub notes: Option<String>,
    /// What happened
    #[serde(default)]
    pub actual: ActualOutcome,
}

/// Updated state after feedback
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    /// Always `ok`
    pub status: String,
    /// The state now on disk
    pub state: UserState,
}

/// Result of closing a day
#[derive(Debug, Clone, Serialize)]
pub struct CloseDayResponse {
    /// The closed-loop entry written to the session log
    pub log_entry: SessionLogEntry,
    /// Session log file that received it
    pub log_path: String,
    /// The state now on disk
    pub state: UserState,
}

// ================================================================================================
// Onboarding
// ================================================================================================

/// Personal fields of the intake form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeProfile {
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Name to address the user by
    #[serde(default)]
    pub preferred_name: Option<String>,
    /// Bodyweight
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Height
    #[serde(default)]
    pub height_cm: Option<f64>,
    /// Body fat
    #[serde(default)]
    pub body_fat_pct: Option<f64>,
}

/// The complete onboarding form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingIntake {
    /// Personal fields
    #[serde(default)]
    pub profile: IntakeProfile,
    /// Climbing history
    #[serde(default)]
    pub experience: Experience,
    /// Best reported grades
    #[serde(default)]
    pub grades: ReportedGrades,
    /// Goal
    #[serde(default)]
    pub goal: Goal,
    /// Self-reported weaknesses
    #[serde(default)]
    pub self_eval: SelfEvaluation,
    /// Strength test results
    #[serde(default)]
    pub tests: TestResults,
    /// Injuries as `{area, side?, ...}` records
    #[serde(default)]
    pub limitations: Vec<Value>,
    /// Home and gym equipment
    #[serde(default)]
    pub equipment: Equipment,
    /// Weekly availability
    #[serde(default)]
    pub availability: AvailabilityInput,
    /// Planning preferences, defaulting to three hard days out of four
    #[serde(default)]
    pub planning_prefs: Option<PlanningPrefs>,
    /// Planned trips
    #[serde(default)]
    pub trips: Vec<Trip>,
}

/// Result of onboarding
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingResponse {
    /// Computed profile
    pub profile: AssessmentProfile,
    /// Generated macrocycle
    pub macrocycle: Macrocycle,
}

// ================================================================================================
// Logs
// ================================================================================================

/// Where an appended log entry went
#[derive(Debug, Clone, Serialize)]
pub struct LogAppendResponse {
    /// Always `ok`
    pub status: String,
    /// File name of the log that received the entry
    pub log_path: String,
}

/// Outdoor sessions since a date
#[derive(Debug, Clone, Serialize)]
pub struct OutdoorSessionsResponse {
    /// Sessions in file order
    pub sessions: Vec<OutdoorSession>,
    /// Number of sessions
    pub count: usize,
}
