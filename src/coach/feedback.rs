// ABOUTME: Feedback and day-closing routes feeding the closed loop
// ABOUTME: Progression, stimulus recency, the difficulty log, and adaptive replanning in one save
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::errors::AppResult;
use crux_core::models::UserState;
use crux_intelligence::adaptive::{
    append_feedback_log, apply_adaptive_replan, check_adaptive_replan,
};
use crux_intelligence::closed_loop::{apply_day_result, parse_status};
use crux_intelligence::{apply_feedback, close_day};
use tracing::info;

use super::{file_name, CloseDayRequest, CloseDayResponse, Coach, FeedbackRequest, FeedbackResponse};

/// Insert recovery into the current plan when recent feedback warrants it
fn adapt_current_plan(state: &mut UserState, current: NaiveDate) {
    let Some(plan) = state.current_week_plan.as_ref() else {
        return;
    };
    let actions = check_adaptive_replan(plan, &state.feedback_log, current);
    if actions.is_empty() {
        return;
    }
    let adapted = apply_adaptive_replan(plan, &actions);
    info!(actions = actions.len(), revision = adapted.plan_revision, "plan adapted to feedback");
    state.current_week_plan = Some(adapted);
}

impl Coach {
    /// Apply session feedback (`POST /feedback`)
    ///
    /// Progression runs first, then the day result when the resolved day is
    /// given, then the difficulty log and the adaptive check against the
    /// current week plan.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a status other than `done` or
    /// `skipped`, or an error when the catalog or state cannot be accessed
    pub fn apply_feedback(&self, request: &FeedbackRequest) -> AppResult<FeedbackResponse> {
        let status = parse_status(&request.status)?;
        let catalog = self.catalog()?;
        let state = self.store.load()?;

        let mut updated = apply_feedback(&request.log_entry, &state);
        if let Some(resolved_day) = &request.resolved_day {
            apply_day_result(&mut updated, resolved_day, status);
        }
        append_feedback_log(
            &mut updated,
            &request.log_entry,
            request.resolved_day.as_ref(),
            catalog,
        );
        adapt_current_plan(&mut updated, request.log_entry.date);

        self.store.save(&updated)?;
        info!(
            date = %request.log_entry.date,
            status = status.as_str(),
            feedback_items = request.log_entry.actual.exercise_feedback_v1.len(),
            "feedback applied"
        );
        Ok(FeedbackResponse {
            status: "ok".to_owned(),
            state: updated,
        })
    }

    /// Close a resolved day: build its log entry, append it, and update the state
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a status other than `done` or
    /// `skipped`, or an error when the catalog, state, or log cannot be accessed
    pub fn close_day(&self, request: CloseDayRequest) -> AppResult<CloseDayResponse> {
        let catalog = self.catalog()?;
        let state = self.store.load()?;
        let closed = close_day(
            &state,
            &request.resolved_day,
            &request.status,
            request.notes.as_deref(),
            request.actual,
            catalog,
        )?;

        let mut updated = closed.state;
        adapt_current_plan(&mut updated, closed.log_entry.date);
        let path = self
            .session_log
            .append(closed.log_entry.date, &closed.log_entry)?;
        self.store.save(&updated)?;
        Ok(CloseDayResponse {
            log_entry: closed.log_entry,
            log_path: file_name(&path),
            state: updated,
        })
    }
}
