// ABOUTME: Week plan records: profile snapshot, days, planned sessions, load summary, adaptation trace
// ABOUTME: Replanner events and adaptive actions, serialized with their wire tags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::common::{
    DomainWeights, Intensity, Location, PhaseId, SessionStatus, SessionTags, Slot, Weekday,
};
use super::resolved::ResolvedSession;
use super::user_state::PlanningPrefs;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format tag written into every generated week plan
pub const PLAN_VERSION: &str = "planner.v2";

const fn first_revision() -> u32 {
    1
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Planner inputs frozen into the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Phase the week was planned in
    pub phase_id: PhaseId,
    /// Phase domain weights
    pub domain_weights: DomainWeights,
    /// Phase intensity cap
    pub intensity_cap: Intensity,
    /// Locations the planner could use
    pub allowed_locations: Vec<Location>,
    /// Effective weekly hard-day cap
    pub hard_cap_per_week: u32,
    /// Planning preferences at generation time
    #[serde(default)]
    pub planning_prefs: PlanningPrefs,
}

/// Weekly load totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Sum of session load scores
    pub total_load: u32,
    /// Days with at least one hard session
    pub hard_days_count: u32,
    /// Days that are empty or low-intensity only
    pub recovery_days_count: u32,
}

/// Per-week targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekTargets {
    /// Hard-day cap
    pub hard_days: u32,
    /// Finger days placed
    pub finger_days: u32,
    /// Volume factor, 0.5 on deload weeks
    pub deload_factor: f64,
}

/// One line of a session's explain trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    /// Phase in effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseId>,
    /// Slot used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
    /// Weekday used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    /// Why this session is here
    pub reason: String,
}

impl ExplainEntry {
    /// Entry carrying only a reason
    #[must_use]
    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            phase: None,
            slot: None,
            weekday: None,
            reason: reason.into(),
        }
    }
}

/// A session placed on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSession {
    /// Slot
    pub slot: Slot,
    /// Catalog session id
    pub session_id: String,
    /// Location
    pub location: Location,
    /// Gym for gym sessions
    #[serde(default)]
    pub gym_id: Option<String>,
    /// Phase the session belongs to
    pub phase_id: PhaseId,
    /// Intensity
    pub intensity: Intensity,
    /// Fallback load score from intensity
    #[serde(default)]
    pub estimated_load_score: u32,
    /// Constraint tags
    pub tags: SessionTags,
    /// Constraints that shaped this entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints_applied: Vec<String>,
    /// Placement trace
    #[serde(default)]
    pub explain: Vec<ExplainEntry>,
    /// Completion status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    /// Inline resolution attached by the week view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Box<ResolvedSession>>,
}

impl PlannedSession {
    /// Whether the session is still to be trained
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status.is_none()
    }

    /// Whether the session is marked done or skipped
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_some()
    }
}

/// One calendar day of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    /// Date
    pub date: NaiveDate,
    /// Weekday
    pub weekday: Weekday,
    /// Sessions ordered by slot
    #[serde(default)]
    pub sessions: Vec<PlannedSession>,
    /// Day-level completion status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    /// The day has an outdoor-only slot and is left to the crag
    #[serde(default)]
    pub outdoor_slot: bool,
    /// The day lies in a pre-trip deload window
    #[serde(default, skip_serializing_if = "is_false")]
    pub pretrip_deload: bool,
}

impl PlanDay {
    /// Whether any session is hard
    #[must_use]
    pub fn has_hard(&self) -> bool {
        self.sessions.iter().any(|s| s.tags.hard)
    }

    /// Whether any not-done session is hard
    #[must_use]
    pub fn has_pending_hard(&self) -> bool {
        self.sessions
            .iter()
            .any(|s| s.tags.hard && s.status != Some(SessionStatus::Done))
    }

    /// Whether any session loads the fingers
    #[must_use]
    pub fn has_finger(&self) -> bool {
        self.sessions.iter().any(|s| s.tags.finger)
    }

    /// Sort sessions by slot, then id
    pub fn sort_sessions(&mut self) {
        self.sessions
            .sort_by(|a, b| (a.slot, &a.session_id).cmp(&(b.slot, &b.session_id)));
    }
}

/// One planned week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWeek {
    /// 1-based index inside the plan
    pub week_index: u32,
    /// Phase of the week
    pub phase: PhaseId,
    /// Targets
    pub targets: WeekTargets,
    /// Seven days, Monday first
    pub days: Vec<PlanDay>,
}

/// A generated week plan plus its adaptation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    /// Format tag
    pub plan_version: String,
    /// Generation timestamp
    pub generated_at: String,
    /// Monday of the week
    pub start_date: NaiveDate,
    /// Planner inputs
    pub profile_snapshot: ProfileSnapshot,
    /// Load totals at generation time
    pub weekly_load_summary: LoadSummary,
    /// Planned weeks (one per plan)
    pub weeks: Vec<PlanWeek>,
    /// Applied events and adaptations in order
    #[serde(default)]
    pub adaptations: Vec<Adaptation>,
    /// Bumped on every mutation
    #[serde(default = "first_revision")]
    pub plan_revision: u32,
}

impl WeekPlan {
    /// Days of the first week
    #[must_use]
    pub fn days(&self) -> &[PlanDay] {
        self.weeks.first().map_or(&[], |w| w.days.as_slice())
    }

    /// Mutable days of the first week
    pub fn days_mut(&mut self) -> &mut [PlanDay] {
        self.weeks
            .first_mut()
            .map_or(&mut [], |w| w.days.as_mut_slice())
    }

    /// Day at `date`
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&PlanDay> {
        self.days().iter().find(|d| d.date == date)
    }

    /// Mutable day at `date`
    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut PlanDay> {
        self.days_mut().iter_mut().find(|d| d.date == date)
    }

    /// Phase of the plan
    #[must_use]
    pub const fn phase_id(&self) -> PhaseId {
        self.profile_snapshot.phase_id
    }

    /// Default gym from the planning preferences snapshot
    #[must_use]
    pub fn default_gym_id(&self) -> Option<&str> {
        self.profile_snapshot
            .planning_prefs
            .default_gym_id
            .as_deref()
            .filter(|g| !g.is_empty())
    }

    /// Number of days holding a not-done hard session
    #[must_use]
    pub fn pending_hard_days(&self) -> u32 {
        self.days().iter().filter(|d| d.has_pending_hard()).count() as u32
    }
}

/// Partial update of one availability slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    /// Weekday to change (ignored when the event carries a date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    /// Slot to change
    pub slot: Slot,
    /// New availability flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    /// New location list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    /// New preferred location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_location: Option<Location>,
    /// New slot gym
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
}

const fn evening() -> Slot {
    Slot::Evening
}

/// An edit applied to an existing week plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ReplanEvent {
    /// Move a session to another day or slot
    MoveSession {
        /// Origin day
        from_date: NaiveDate,
        /// Origin slot
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_slot: Option<Slot>,
        /// Destination day
        to_date: NaiveDate,
        /// Destination slot
        to_slot: Slot,
        /// Session id to move
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_ref: Option<String>,
    },
    /// Mark a session as trained
    MarkDone {
        /// Day
        date: NaiveDate,
        /// Session id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_ref: Option<String>,
        /// Slot
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<Slot>,
    },
    /// Mark a session as not trained
    MarkSkipped {
        /// Day
        date: NaiveDate,
        /// Session id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_ref: Option<String>,
        /// Slot
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<Slot>,
    },
    /// Change one availability slot and re-plan the week
    SetAvailability {
        /// Day implying the weekday
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
        /// The change
        availability: AvailabilityChange,
    },
    /// Add a session to a free slot
    QuickAdd {
        /// Day
        date: NaiveDate,
        /// Catalog session id
        session_id: String,
        /// Slot
        #[serde(default = "evening")]
        slot: Slot,
        /// Location
        location: Location,
        /// Gym for gym sessions
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gym_id: Option<String>,
        /// Phase override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase_id: Option<PhaseId>,
    },
    /// Run the feedback-driven adaptive check as of `date`
    AdaptiveReplan {
        /// Reference date
        date: NaiveDate,
    },
}

/// Conservative plan change proposed by the adaptive detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdaptiveAction {
    /// Replace a whole day with recovery
    InsertRecovery {
        /// Day to replace
        target_date: NaiveDate,
        /// Human-readable reason
        reason: String,
        /// Session placed instead
        replacement_session_id: String,
    },
    /// Replace the next hard session with a medium one
    DowngradeNextHard {
        /// Day to change
        target_date: NaiveDate,
        /// Human-readable reason
        reason: String,
        /// Session replaced
        original_session_id: String,
        /// Session placed instead
        replacement_session_id: String,
    },
}

impl AdaptiveAction {
    /// Day the action applies to
    #[must_use]
    pub const fn target_date(&self) -> NaiveDate {
        match self {
            Self::InsertRecovery { target_date, .. } | Self::DowngradeNextHard { target_date, .. } => {
                *target_date
            }
        }
    }
}

/// One entry of the plan's adaptation trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Adaptation {
    /// A replanner event was applied
    Event {
        /// The event
        event: ReplanEvent,
    },
    /// A session was quick-added
    QuickAdd {
        /// Day
        target_date: NaiveDate,
        /// Session added
        session_id: String,
        /// Slot used
        slot: Slot,
    },
    /// A quick-add pushed the week past its hard-day cap
    HardCapWarning {
        /// Day of the added session
        target_date: NaiveDate,
        /// Warning text
        message: String,
    },
    /// A day was overridden by intent
    DayOverride {
        /// Day the user acted from
        reference_date: NaiveDate,
        /// Day replaced
        target_date: NaiveDate,
        /// Days checked for recovery ripple
        ripple_days: Vec<NaiveDate>,
    },
    /// A lost finger stimulus was moved to another day
    FingerCompensation {
        /// Day receiving the finger session
        compensated_date: NaiveDate,
        /// Day that lost it
        lost_date: NaiveDate,
    },
    /// No day could take the lost finger stimulus
    FingerCompensationWarning {
        /// Day that lost it
        lost_date: NaiveDate,
        /// Explanation
        message: String,
    },
    /// Override phase differs from the plan phase
    PhaseMismatchWarning {
        /// Phase requested by the override
        requested_phase: PhaseId,
        /// Phase of the plan
        current_phase: PhaseId,
        /// Explanation
        message: String,
    },
    /// Adaptive actions applied after feedback
    AdaptiveReplan {
        /// First target date
        date: Option<NaiveDate>,
        /// Applied actions
        actions: Vec<AdaptiveAction>,
    },
}
