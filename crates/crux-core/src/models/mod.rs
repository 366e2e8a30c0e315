// ABOUTME: Typed records for the Crux Coach planner
// ABOUTME: Re-exports user state, macrocycle, week plan, catalog, resolved session, and log types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Data Models
//!
//! Every document the planner reads or writes is modelled here as a serde
//! record. Unknown keys are preserved through `#[serde(flatten)]` maps so a
//! newer producer never loses data when an older build rewrites the file.
//!
//! ## Core Models
//!
//! - `UserState`: the single mutable document (schema 1.5)
//! - `Macrocycle` / `Phase`: multi-week periodization
//! - `WeekPlan` / `PlanDay` / `PlannedSession`: one planned week
//! - `Catalog`: exercises, templates, and session definitions
//! - `ResolvedSession`: a session expanded to concrete exercises
//! - `SessionLogEntry` / `OutdoorSession`: append-only log records

mod assessment;
mod availability;
mod catalog;
mod common;
mod logs;
mod macrocycle;
mod plan;
mod resolved;
mod user_state;

// Shared vocabulary
pub use common::{
    Domain, DomainWeights, FeedbackLabel, Intensity, Location, PhaseId, SessionStatus, SessionTags,
    Slot, Weekday,
};

// Assessment domain
pub use assessment::{
    AssessmentInputs, AssessmentProfile, Axis, BodyMetrics, Discipline, Experience, Goal,
    ReportedGrades, SelfEvaluation, TestResults,
};

// Availability domain
pub use availability::{
    AvailabilityInput, DayAvailabilityInput, SlotAvailability, SlotDetail, SlotInput,
    WeekAvailability,
};

// Macrocycle domain
pub use macrocycle::{GoalSnapshot, Macrocycle, Phase, PretripDeload, Trip};

// Week plan domain
pub use plan::{
    Adaptation, AdaptiveAction, AvailabilityChange, ExplainEntry, LoadSummary, PlanDay, PlanWeek,
    PlannedSession, ProfileSnapshot, ReplanEvent, WeekPlan, WeekTargets, PLAN_VERSION,
};

// Catalog domain
pub use catalog::{
    exercises_from_value, string_list, tag_is_set, Block, Catalog, Exercise, ExerciseAttributes,
    FilterSet, FilterStage, LoadModel, Prescription, Selection, SessionDefinition, SessionModule,
    SessionSummary, Template, TemplateRef, INSTRUCTION_KEYS,
};

// Resolution domain
pub use resolved::{
    BlockStatus, BoulderTarget, CooldownNote, ExerciseInstance, FilterTrace, InstanceSource,
    ResolutionStatus, ResolveContext, ResolvedBlock, ResolvedBody, ResolvedModule,
    ResolvedSession, SelectedExercise, SessionIdentity, SuggestedTargets,
    BOULDER_TARGET_SCHEMA_VERSION, RESOLVER_VERSION, SESSION_INSTANCE_VERSION,
    TARGETS_SCHEMA_VERSION,
};

// User state domain
pub use user_state::{
    AdjustmentRule, Baselines, BoulderOffsets, BoulderTargetsConfig, ClusterCooldown, Cooldowns,
    Equipment, ExerciseOverride, FatigueProxy, FeedbackLogEntry, Gym, HangboardBaseline,
    Limitations, MaxStrengthTest, OverrideExpiry, OverrideMode, Overrides, PlanningPrefs,
    ProgressionConfig, ProgressionCounters, RecencyEntry, StimulusCategory, TestQueueItem, Tests,
    UserProfile, UserState, WorkingLoadEntry, WorkingLoadRules, WorkingLoads,
    FEEDBACK_LOG_CAPACITY, USER_STATE_SCHEMA_VERSION,
};

// Log domain
pub use logs::{
    ActualOutcome, DaySession, ExerciseFeedback, LogSummary, OutdoorAttempt, OutdoorDiscipline,
    OutdoorRoute, OutdoorSession, PlanRef, PlannedInstance, ResolvedDay, SessionLogEntry,
    CLOSED_LOOP_LOG_VERSION, OUTDOOR_LOG_VERSION, SESSION_LOG_SCHEMA_VERSION,
};
