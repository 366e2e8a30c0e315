// ABOUTME: Quick-add of a catalog session into a free slot with a one-day recovery ripple
// ABOUTME: Exceeding the weekly hard cap is reported as a warning, never rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::dates::add_days;
use crux_core::errors::PlanningError;
use crux_core::models::{
    Adaptation, ExplainEntry, Location, PhaseId, PlannedSession, Slot, WeekPlan,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{day_index, ripple_day, Ripple};
use crate::planner::{load_summary, planned_session};
use crate::training_constants::sessions;

const QUICK_ADD: &str = "quick_add";
const QUICK_ADD_RIPPLE: &str = "quick_add_ripple";

/// A session the user adds on top of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAdd {
    /// Day to add to
    pub date: NaiveDate,
    /// Catalog session id
    pub session_id: String,
    /// Free slot to use
    pub slot: Slot,
    /// Where the session runs
    pub location: Location,
    /// Gym, defaulting to the plan's default gym for gym sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
    /// Phase, defaulting to the plan phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<PhaseId>,
}

/// Result of [`apply_day_add`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAddOutcome {
    /// The updated plan
    pub plan: WeekPlan,
    /// Non-blocking warnings
    pub warnings: Vec<String>,
}

/// Add the session in place and return the warnings
pub(super) fn add_session(
    plan: &mut WeekPlan,
    request: &DayAdd,
) -> Result<Vec<String>, PlanningError> {
    if request.session_id.trim().is_empty() {
        return Err(PlanningError::invalid_input("session_id", "must not be empty"));
    }
    let index = day_index(plan, request.date)?;
    if plan.days()[index]
        .sessions
        .iter()
        .any(|s| s.slot == request.slot)
    {
        return Err(PlanningError::slot_occupied(request.date, request.slot.as_str()));
    }

    let phase = request.phase_id.unwrap_or_else(|| plan.phase_id());
    let gym_id = match (&request.gym_id, request.location) {
        (Some(gym), _) => Some(gym.clone()),
        (None, Location::Gym) => plan.default_gym_id().map(str::to_owned),
        (None, _) => None,
    };
    let mut session = planned_session(
        &request.session_id,
        request.slot,
        request.location,
        gym_id,
        phase,
    );
    session.constraints_applied.push(QUICK_ADD.to_owned());
    session.explain = vec![
        ExplainEntry::reason("user quick-add session"),
        ExplainEntry::reason(format!("added_session={}", request.session_id)),
    ];
    let loads_recovery = session.tags.hard || session.tags.finger;

    let day = &mut plan.days_mut()[index];
    day.sessions.push(session);
    day.sort_sessions();

    if loads_recovery {
        let next = add_days(request.date, 1);
        if let Some(next_day) = plan.day_mut(next) {
            ripple_day(
                next_day,
                Ripple::Proportional,
                phase,
                QUICK_ADD_RIPPLE,
                request.date,
            );
        }
    }

    let cap = plan.profile_snapshot.hard_cap_per_week;
    let hard_days = plan.pending_hard_days();
    let mut warnings = Vec::new();
    if hard_days > cap {
        warnings.push(format!(
            "Hard session count ({hard_days}) exceeds weekly cap ({cap})"
        ));
    }

    plan.weekly_load_summary = load_summary(plan.days());
    plan.adaptations.push(Adaptation::QuickAdd {
        target_date: request.date,
        session_id: request.session_id.clone(),
        slot: request.slot,
    });
    plan.adaptations.extend(warnings.iter().map(|message| Adaptation::HardCapWarning {
        target_date: request.date,
        message: message.clone(),
    }));
    info!(
        date = %request.date,
        session_id = %request.session_id,
        known = sessions::lookup(&request.session_id).is_some(),
        "session quick-added"
    );
    Ok(warnings)
}

/// Whether `session` was placed by a user quick-add
pub(super) fn is_quick_added(session: &PlannedSession) -> bool {
    session.constraints_applied.iter().any(|c| c == QUICK_ADD)
}

/// Add a session to a free slot of a copy of `plan`
///
/// A hard or finger session ripples into the next day: hard sessions become
/// `complementary_conditioning` and other non-low sessions
/// `regeneration_easy`.
///
/// # Errors
///
/// Returns `PlanningError::DateNotInPlan` for a date outside the week and
/// `PlanningError::SlotOccupied` when the slot already holds a session.
pub fn apply_day_add(plan: &WeekPlan, request: &DayAdd) -> Result<DayAddOutcome, PlanningError> {
    let mut updated = plan.clone();
    let warnings = add_session(&mut updated, request)?;
    updated.plan_revision += 1;
    Ok(DayAddOutcome {
        plan: updated,
        warnings,
    })
}
