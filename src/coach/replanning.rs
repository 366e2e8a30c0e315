// ABOUTME: Replanning routes: day overrides, event streams, quick-adds, and session suggestions
// ABOUTME: Every change lands on the stored current week plan with new sessions resolved inline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::dates::today;
use crux_core::errors::{AppError, AppResult};
use crux_core::models::{UserState, WeekPlan};
use crux_intelligence::planner::{normalize_availability, DEFAULT_LOCATIONS};
use crux_intelligence::{
    apply_day_add, apply_day_override, apply_events, suggest_sessions, DayAdd, DayOverride,
    ReplanContext,
};
use tracing::info;

use super::planning::resolve_plan_inline;
use super::{
    Coach, EventsRequest, OverrideRequest, QuickAddRequest, SuggestionsRequest,
    SuggestionsResponse, WeekPlanResponse,
};

/// The plan a replanning request works on: the one sent, else the stored one
fn working_plan(sent: Option<WeekPlan>, state: &UserState) -> AppResult<WeekPlan> {
    sent.or_else(|| state.current_week_plan.clone()).ok_or_else(|| {
        AppError::precondition("week_plan is required; generate one from the week view first")
    })
}

impl Coach {
    /// Resolve new sessions of `plan`, store it as the current plan, and save
    fn commit_plan(&self, mut state: UserState, mut plan: WeekPlan) -> AppResult<WeekPlan> {
        let catalog = self.catalog()?;
        let recent = self.recent_exercise_ids(today())?;
        state.overrides = resolve_plan_inline(&mut plan, catalog, &state, &recent);
        state.current_week_plan = Some(plan.clone());
        self.store.save(&state)?;
        Ok(plan)
    }

    /// Train a different intent on a day (`POST /replanner/override`)
    ///
    /// Hard overrides ripple recovery into the two following days.
    ///
    /// # Errors
    ///
    /// Returns a precondition error without a plan, an invalid-input error for
    /// an unknown intent or a date outside the week, or a storage error
    pub fn override_day(&self, request: OverrideRequest) -> AppResult<WeekPlanResponse> {
        let state = self.store.load()?;
        let plan = working_plan(request.week_plan, &state)?;
        let day_override = DayOverride {
            intent: request.intent,
            location: request.location,
            reference_date: request.reference_date,
            slot: request.slot,
            phase_id: request.phase_id,
            target_date: request.target_date,
            gym_id: request.gym_id,
        };
        let updated = apply_day_override(&plan, &day_override)?;
        info!(
            intent = %day_override.intent,
            target = %day_override.resolved_target(),
            revision = updated.plan_revision,
            "day overridden"
        );
        Ok(WeekPlanResponse {
            week_plan: self.commit_plan(state, updated)?,
            warnings: Vec::new(),
        })
    }

    /// Apply replanning events in order (`POST /replanner/events`)
    ///
    /// # Errors
    ///
    /// Returns a precondition error without a plan, a consistency error when
    /// an event references a missing session or an occupied slot, or a
    /// storage error
    pub fn apply_events(&self, request: EventsRequest) -> AppResult<WeekPlanResponse> {
        let state = self.store.load()?;
        let plan = working_plan(request.week_plan, &state)?;
        let updated = {
            let availability = normalize_availability(&state.availability, &DEFAULT_LOCATIONS);
            let mut context =
                ReplanContext::new(availability, &state.planning_prefs, &state.equipment.gyms)
                    .with_feedback_log(&state.feedback_log);
            apply_events(&plan, &request.events, &mut context)?
        };
        info!(
            events = request.events.len(),
            revision = updated.plan_revision,
            "replan events applied"
        );
        Ok(WeekPlanResponse {
            week_plan: self.commit_plan(state, updated)?,
            warnings: Vec::new(),
        })
    }

    /// Add a session to a free slot
    ///
    /// Cap and spacing breaches are reported as warnings, not errors.
    ///
    /// # Errors
    ///
    /// Returns a precondition error without a plan, a consistency error when
    /// the slot is taken, or a storage error
    pub fn quick_add(&self, request: QuickAddRequest) -> AppResult<WeekPlanResponse> {
        let state = self.store.load()?;
        let plan = working_plan(request.week_plan, &state)?;
        let outcome = apply_day_add(
            &plan,
            &DayAdd {
                date: request.target_date,
                session_id: request.session_id,
                slot: request.slot,
                location: request.location,
                gym_id: request.gym_id,
                phase_id: request.phase_id,
            },
        )?;
        info!(
            date = %request.target_date,
            warnings = outcome.warnings.len(),
            "session added"
        );
        Ok(WeekPlanResponse {
            week_plan: self.commit_plan(state, outcome.plan)?,
            warnings: outcome.warnings,
        })
    }

    /// Rank sessions that fit a day of the current plan
    ///
    /// # Errors
    ///
    /// Returns a precondition error when no week plan is stored
    pub fn suggestions(&self, request: &SuggestionsRequest) -> AppResult<SuggestionsResponse> {
        let state = self.store.load()?;
        let plan = working_plan(None, &state)?;
        let suggestions =
            suggest_sessions(&plan, request.date, request.location, None, request.limit);
        Ok(SuggestionsResponse {
            date: request.date,
            location: request.location,
            suggestions,
        })
    }
}
