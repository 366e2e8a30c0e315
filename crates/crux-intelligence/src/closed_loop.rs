// ABOUTME: Closed-loop updater turning a trained or skipped day into a log entry and state changes
// ABOUTME: Stimulus recency per category, fatigue counters, progression, and the feedback log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Closed Loop
//!
//! A day closes as `done` or `skipped`. Closing it:
//!
//! 1. builds a `closed_loop.v1` log entry with a summary
//! 2. updates the recency record of every stimulus category the day trained
//! 3. adds to the fatigue counters
//! 4. applies per-exercise feedback through the progression engine
//! 5. appends the day's fatigue-weighted difficulty to the feedback log

use crux_core::errors::PlanningError;
use crux_core::models::{
    ActualOutcome, Catalog, DaySession, LogSummary, ResolvedDay, SessionLogEntry, SessionStatus,
    StimulusCategory, UserState, CLOSED_LOOP_LOG_VERSION,
};
use serde_json::Map;
use tracing::{debug, info};

use crate::adaptive::append_feedback_log;
use crate::progression::apply_feedback;

const DEFAULT_TRAINING_DAYS: u32 = 4;
const DEFAULT_HARD_CAP: u32 = 3;

/// Seed the recency categories, fatigue counters, and planning preferences
pub fn ensure_planning_defaults(state: &mut UserState) {
    for category in StimulusCategory::ALL {
        state.stimulus_recency.entry(category).or_default();
    }
    let prefs = &mut state.planning_prefs;
    prefs
        .target_training_days_per_week
        .get_or_insert(DEFAULT_TRAINING_DAYS);
    prefs.hard_day_cap_per_week.get_or_insert(DEFAULT_HARD_CAP);
}

/// Parse a closing status; only `done` and `skipped` close a day
///
/// # Errors
///
/// Returns `PlanningError::InvalidFeedbackStatus` for any other value
pub fn parse_status(raw: &str) -> Result<SessionStatus, PlanningError> {
    SessionStatus::parse(raw).ok_or_else(|| PlanningError::InvalidFeedbackStatus {
        status: raw.to_owned(),
    })
}

/// Log entry recording how a resolved day went
#[must_use]
pub fn build_log_entry(
    resolved_day: &ResolvedDay,
    status: SessionStatus,
    notes: Option<&str>,
    actual: ActualOutcome,
) -> SessionLogEntry {
    let session_ids: Vec<String> = resolved_day
        .sessions
        .iter()
        .map(|s| s.session_id.clone())
        .collect();
    let first = resolved_day.sessions.first();
    let plan = resolved_day.plan.as_ref();
    SessionLogEntry {
        schema_version: None,
        log_version: CLOSED_LOOP_LOG_VERSION.to_owned(),
        date: resolved_day.date,
        status: Some(status),
        plan_version: plan.and_then(|p| p.plan_version.clone()),
        start_date: plan.and_then(|p| p.start_date),
        location: first.and_then(|s| s.location),
        gym_id: first.and_then(|s| s.gym_id.clone()),
        session_ids: session_ids.clone(),
        resolved_ref: resolved_day.resolved_ref.clone(),
        planned: resolved_day.sessions.clone(),
        actual,
        notes: notes.unwrap_or_default().to_owned(),
        summary: Some(LogSummary {
            session_count: resolved_day.sessions.len(),
            status,
            categories: resolved_day.categories(),
            session_ids,
        }),
        extra: Map::new(),
    }
}

fn count(sessions: &[DaySession], predicate: impl Fn(&DaySession) -> bool) -> u32 {
    sessions.iter().filter(|s| predicate(s)).count() as u32
}

/// Update recency and fatigue counters for a closed day
pub fn apply_day_result(state: &mut UserState, resolved_day: &ResolvedDay, status: SessionStatus) {
    ensure_planning_defaults(state);
    let date = resolved_day.date;
    for category in resolved_day.categories() {
        let entry = state.stimulus_recency.entry(category).or_default();
        match status {
            SessionStatus::Done => {
                entry.last_done_date = Some(date);
                entry.done_count += 1;
            }
            SessionStatus::Skipped => {
                entry.last_skipped_date = Some(date);
                entry.skipped_count += 1;
            }
        }
    }

    let sessions = &resolved_day.sessions;
    let fatigue = &mut state.fatigue_proxy;
    match status {
        SessionStatus::Done => {
            fatigue.done_sessions_total += sessions.len() as u32;
            fatigue.hard_sessions_total += count(sessions, |s| s.has_tag("hard"));
            fatigue.finger_sessions_total += count(sessions, |s| s.has_tag("finger"));
            fatigue.endurance_sessions_total +=
                count(sessions, |s| s.session_id.contains("endurance"));
        }
        SessionStatus::Skipped => {
            fatigue.skipped_sessions_total += sessions.len() as u32;
        }
    }
    fatigue.last_updated_date = Some(date);
    debug!(%date, status = status.as_str(), "day result applied");
}

/// Everything produced by closing a day
#[derive(Debug, Clone)]
pub struct ClosedDay {
    /// Entry to append to the session log
    pub log_entry: SessionLogEntry,
    /// Updated state
    pub state: UserState,
}

/// Close a resolved day and return the log entry with the updated state
///
/// # Errors
///
/// Returns `PlanningError::InvalidFeedbackStatus` unless `status` is `done`
/// or `skipped`
pub fn close_day(
    state: &UserState,
    resolved_day: &ResolvedDay,
    status: &str,
    notes: Option<&str>,
    actual: ActualOutcome,
    catalog: &Catalog,
) -> Result<ClosedDay, PlanningError> {
    let status = parse_status(status)?;
    let log_entry = build_log_entry(resolved_day, status, notes, actual);

    let mut updated = apply_feedback(&log_entry, state);
    apply_day_result(&mut updated, resolved_day, status);
    append_feedback_log(&mut updated, &log_entry, Some(resolved_day), catalog);

    info!(
        date = %resolved_day.date,
        status = status.as_str(),
        sessions = resolved_day.sessions.len(),
        "day closed"
    );
    Ok(ClosedDay {
        log_entry,
        state: updated,
    })
}
