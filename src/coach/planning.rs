// ABOUTME: Assessment, macrocycle, week, and single-session routes of the coach service
// ABOUTME: Checks preconditions at the boundary, runs the engines, and persists what they produce
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::dates::{now_timestamp, parse_date_lenient, this_monday, today};
use crux_core::errors::{AppError, AppResult, ErrorCode};
use crux_core::models::{Catalog, Goal, Overrides, UserState, WeekPlan};
use crux_intelligence::macrocycle::week_context;
use crux_intelligence::planner::{normalize_availability, DEFAULT_LOCATIONS};
use crux_intelligence::{
    assess, consume_overrides, generate_macrocycle, inject_session_targets, plan_week,
    resolve_session, MacrocycleRequest, PlanRequest, ResolveRequest,
};
use tracing::{info, warn};

use super::{
    AssessmentRequest, AssessmentResponse, Coach, MacrocycleGenerateRequest, MacrocycleResponse,
    ResolveSessionRequest, ResolveSessionResponse, WeekResponse,
};

/// Resolve every session of `plan` that has no resolution yet
///
/// A session that fails to resolve keeps `resolved` empty; the rest of the
/// week is still usable. Occurrence-limited overrides are counted down in
/// day order, so an override with one use left lands on the first session
/// only. Returns the overrides left for the state.
pub(super) fn resolve_plan_inline(
    plan: &mut WeekPlan,
    catalog: &Catalog,
    state: &UserState,
    recent: &[String],
) -> Overrides {
    let mut overrides = state.overrides.clone();
    for day in plan.days_mut() {
        let date = day.date;
        for session in day.sessions.iter_mut().filter(|s| s.resolved.is_none()) {
            let request = ResolveRequest::new(&session.session_id, catalog, state)
                .with_location(Some(session.location))
                .with_gym(session.gym_id.as_deref())
                .with_date(Some(date))
                .with_overrides(&overrides)
                .with_recent(recent);
            match resolve_session(&request) {
                Ok(mut resolved) => {
                    consume_overrides(&mut overrides, &resolved);
                    inject_session_targets(&mut resolved, state);
                    session.resolved = Some(Box::new(resolved));
                }
                Err(error) => {
                    warn!(%date, session_id = %session.session_id, %error, "inline resolution failed");
                }
            }
        }
    }
    overrides
}

/// Goal deadline check; unparseable deadlines are left to the generator
fn check_deadline(goal: &Goal, today: NaiveDate) -> AppResult<()> {
    let deadline = goal.deadline.as_deref().and_then(parse_date_lenient);
    match deadline {
        Some(deadline) if deadline < today => Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            "Goal deadline is in the past. Please update your goal with a future date.",
        )
        .with_resource_id(deadline.to_string())),
        _ => Ok(()),
    }
}

impl Coach {
    /// Compute the six-axis profile and store it (`POST /assessment/compute`)
    ///
    /// Inputs and goal default to the stored ones.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when no goal is available, an engine error
    /// when the reported grades are unknown, or a storage error
    pub fn compute_assessment(&self, request: AssessmentRequest) -> AppResult<AssessmentResponse> {
        let mut state = self.store.load()?;
        let inputs = request
            .assessment
            .unwrap_or_else(|| state.assessment.clone());
        let goal = match request.goal {
            Some(goal) if goal.is_set() => goal,
            _ if state.goal.is_set() => state.goal.clone(),
            _ => {
                return Err(AppError::precondition(
                    "No goal provided and none in state",
                ))
            }
        };

        let profile = assess(&inputs, &goal)?;
        state.assessment.profile = Some(profile);
        state.assessment.last_assessed = Some(now_timestamp());
        self.store.save(&state)?;
        info!(
            finger = profile.finger_strength,
            pulling = profile.pulling_strength,
            "assessment computed"
        );
        Ok(AssessmentResponse { profile })
    }

    /// Generate and store a macrocycle (`POST /macrocycle/generate`)
    ///
    /// The cached week plan is dropped because its phase context is gone.
    ///
    /// # Errors
    ///
    /// Returns a precondition error without goal or profile, a value error for
    /// a past deadline or fewer than nine weeks, or a storage error
    pub fn generate_macrocycle(
        &self,
        request: &MacrocycleGenerateRequest,
    ) -> AppResult<MacrocycleResponse> {
        let mut state = self.store.load()?;
        if !state.goal.is_set() {
            return Err(AppError::precondition(
                "No goal in state; complete onboarding first",
            ));
        }
        let Some(profile) = state.assessment.profile else {
            return Err(AppError::precondition(
                "No assessment profile; run assessment first",
            ));
        };
        let today = today();
        check_deadline(&state.goal, today)?;

        let macrocycle = generate_macrocycle(&MacrocycleRequest {
            goal: &state.goal,
            profile: &profile,
            trips: &state.trips,
            start_date: request.start_date.unwrap_or_else(|| this_monday(today)),
            total_weeks: request.total_weeks,
        })?;

        state.macrocycle = Some(macrocycle.clone());
        state.invalidate_week_cache();
        self.store.save(&state)?;
        info!(
            start = %macrocycle.start_date,
            total_weeks = macrocycle.total_weeks,
            "macrocycle generated"
        );
        Ok(MacrocycleResponse { macrocycle })
    }

    /// Plan a week of the macrocycle with every session resolved (`GET /week/{week_num}`)
    ///
    /// Week 0 is the week containing today. The plan becomes the current week
    /// plan the replanner works on.
    ///
    /// # Errors
    ///
    /// Returns a precondition error without a macrocycle, not-found past the
    /// last week, or an error when the catalog or state cannot be accessed
    pub fn week(&self, week_num: u32) -> AppResult<WeekResponse> {
        let mut state = self.store.load()?;
        let Some(macrocycle) = state.macrocycle.as_ref() else {
            return Err(AppError::precondition("No macrocycle; generate one first"));
        };
        let today = today();
        let context = week_context(macrocycle, week_num, today)?;

        let availability = normalize_availability(&state.availability, &DEFAULT_LOCATIONS);
        let default_gym_id = state
            .default_gym_id()
            .or_else(|| state.equipment.gyms.first().map(|g| g.gym_id.as_str()))
            .filter(|id| !id.is_empty());
        let request = PlanRequest::from_context(
            &context,
            &availability,
            &state.planning_prefs,
            &state.equipment.gyms,
            default_gym_id,
        );
        let mut week_plan = plan_week(&request);

        let catalog = self.catalog()?;
        let recent = self.recent_exercise_ids(today)?;
        state.overrides = resolve_plan_inline(&mut week_plan, catalog, &state, &recent);

        state.current_week_plan = Some(week_plan.clone());
        self.store.save(&state)?;
        info!(
            week_num = context.week_num,
            phase = context.phase_id.as_str(),
            days = week_plan.days().len(),
            "week planned"
        );
        Ok(WeekResponse {
            week_num: context.week_num,
            phase_id: context.phase_id,
            week_plan,
        })
    }

    /// Resolve one catalog session (`POST /session/resolve`)
    ///
    /// Occurrence-limited overrides used by the session are counted down and
    /// the state is saved when one changed.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown session id, or an error when the
    /// catalog or state cannot be accessed
    pub fn resolve(&self, request: &ResolveSessionRequest) -> AppResult<ResolveSessionResponse> {
        let mut state = self.store.load()?;
        let catalog = self.catalog()?;
        let context = request.context.clone().unwrap_or_default();
        let date = context.target_date.unwrap_or_else(today);
        let recent = self.recent_exercise_ids(date)?;

        let resolve_request = ResolveRequest::new(&request.session_id, catalog, &state)
            .with_location(context.location)
            .with_gym(context.gym_id.as_deref())
            .with_date(Some(date))
            .with_recent(&recent);
        let mut resolved = resolve_session(&resolve_request)?;
        inject_session_targets(&mut resolved, &state);

        let mut overrides = state.overrides.clone();
        consume_overrides(&mut overrides, &resolved);
        if overrides != state.overrides {
            state.overrides = overrides;
            self.store.save(&state)?;
        }
        info!(session_id = %request.session_id, %date, "session resolved");
        Ok(ResolveSessionResponse { resolved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_past_deadline_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let goal = Goal {
            deadline: Some("2026-01-01".to_owned()),
            ..Goal::default()
        };
        let err = check_deadline(&goal, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_future_or_unparseable_deadline_passes() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for deadline in ["2026-09-01", "autumn"] {
            let goal = Goal {
                deadline: Some(deadline.to_owned()),
                ..Goal::default()
            };
            assert!(check_deadline(&goal, today).is_ok());
        }
    }
}
