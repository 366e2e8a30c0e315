// ABOUTME: Replanner applying user events, day overrides, and quick-adds to an existing week plan
// ABOUTME: Shared day lookup, replacement sessions, and recovery ripple used by every mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Replanner
//!
//! Every mutation works on a copy of the plan and leaves a trace in
//! `adaptations`. After events and overrides the plan is reconciled:
//! finger days closer than two days apart and hard days past the weekly cap
//! are downshifted to `regeneration_easy`, then `plan_revision` is bumped.
//!
//! Sessions with a status (done or skipped) are history. Ripple and
//! reconciliation never rewrite them.

mod events;
mod override_day;
mod quick_add;
mod reconcile;
mod suggestions;

pub use events::{apply_events, ReplanContext};
pub use override_day::{apply_day_override, DayOverride};
pub use quick_add::{apply_day_add, DayAdd, DayAddOutcome};
pub use reconcile::{reconcile, regenerate_preserving_completed};
pub use suggestions::{suggest_sessions, SessionSuggestion};

use chrono::NaiveDate;
use crux_core::errors::PlanningError;
use crux_core::models::{ExplainEntry, Intensity, PhaseId, PlanDay, PlannedSession, WeekPlan};

use crate::planner::planned_session;
use crate::training_constants::sessions::{COMPLEMENTARY, REGENERATION};

/// How far a ripple downgrades the sessions of a following day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ripple {
    /// Hard sessions become complementary, other non-low sessions regeneration
    Proportional,
    /// Every non-low session becomes regeneration
    Recovery,
}

fn day_index(plan: &WeekPlan, date: NaiveDate) -> Result<usize, PlanningError> {
    plan.days()
        .iter()
        .position(|d| d.date == date)
        .ok_or(PlanningError::DateNotInPlan { date })
}

/// Session replacing `reference` in its slot, location, and gym
fn replacement(
    session_id: &str,
    reference: &PlannedSession,
    phase_id: PhaseId,
    constraint: &str,
    explain: &[String],
) -> PlannedSession {
    let mut session = planned_session(
        session_id,
        reference.slot,
        reference.location,
        reference.gym_id.clone(),
        phase_id,
    );
    session.constraints_applied.push(constraint.to_owned());
    session.explain = explain.iter().map(ExplainEntry::reason).collect();
    session
}

/// Downgrade the pending sessions of `day` after a hard neighbour
///
/// Returns the number of sessions replaced.
fn ripple_day(
    day: &mut PlanDay,
    mode: Ripple,
    phase_id: PhaseId,
    constraint: &str,
    source: NaiveDate,
) -> usize {
    let mut changed = 0;
    for session in day.sessions.iter_mut().filter(|s| s.is_pending()) {
        if session.intensity == Intensity::Low {
            continue;
        }
        let target = match mode {
            Ripple::Proportional if session.tags.hard => COMPLEMENTARY,
            Ripple::Proportional | Ripple::Recovery => REGENERATION,
        };
        if session.session_id == target {
            continue;
        }
        *session = replacement(
            target,
            session,
            phase_id,
            constraint,
            &[
                format!("recovery after hard session on {source}"),
                format!("replaced={}", session.session_id),
            ],
        );
        changed += 1;
    }
    if changed > 0 {
        day.sort_sessions();
    }
    changed
}
