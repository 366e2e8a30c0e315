// ABOUTME: Adaptive replan detector reacting to very hard feedback with conservative plan changes
// ABOUTME: Derives fatigue-weighted session difficulty and keeps the short feedback log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Adaptive Replanning
//!
//! Feedback only ever makes the plan easier:
//!
//! - two or more very hard days inside the window insert a recovery day on
//!   the earliest future day that has nothing completed
//! - otherwise a recent very hard day downgrades the next pending hard
//!   session to complementary conditioning

use chrono::NaiveDate;
use crux_core::models::{
    Adaptation, AdaptiveAction, Catalog, ExplainEntry, FeedbackLabel, FeedbackLogEntry, Location,
    PlannedSession, ResolvedDay, SessionLogEntry, Slot, UserState, WeekPlan,
};
use tracing::{debug, info};

use crate::config::PlanningConfig;
use crate::planner::{load_summary, planned_session};
use crate::training_constants::sessions::{COMPLEMENTARY, REGENERATION};

const ADAPTIVE_CONSTRAINT: &str = "adaptive_replan";
const UNKNOWN_SESSION: &str = "unknown";

/// Fatigue-cost-weighted mean of the day's feedback labels
///
/// Exercises missing from the catalog weigh the configured default cost.
/// A day without feedback is `ok`.
#[must_use]
pub fn session_difficulty(log_entry: &SessionLogEntry, catalog: &Catalog) -> FeedbackLabel {
    let default_cost = PlanningConfig::global().adaptive.default_fatigue_cost;
    let (weighted, weight) = log_entry
        .feedback()
        .iter()
        .fold((0.0_f64, 0.0_f64), |(weighted, weight), item| {
            let cost = catalog
                .exercise(&item.exercise_id)
                .map_or(default_cost, |e| e.fatigue_cost);
            let cost = f64::from(cost);
            (weighted + f64::from(item.label().score()) * cost, weight + cost)
        });
    if weight <= 0.0 {
        return FeedbackLabel::Ok;
    }
    FeedbackLabel::from_score(weighted / weight)
}

/// Record the day's difficulty in the feedback log (newest first, capped)
pub fn append_feedback_log(
    state: &mut UserState,
    log_entry: &SessionLogEntry,
    resolved_day: Option<&ResolvedDay>,
    catalog: &Catalog,
) {
    let difficulty = session_difficulty(log_entry, catalog);
    let session_id = resolved_day
        .and_then(|d| d.sessions.first())
        .or_else(|| log_entry.planned.first())
        .map_or_else(|| UNKNOWN_SESSION.to_owned(), |s| s.session_id.clone());
    debug!(date = %log_entry.date, %session_id, %difficulty, "feedback logged");
    state.push_feedback(FeedbackLogEntry {
        date: log_entry.date,
        session_id,
        difficulty,
    });
}

/// Actions warranted by recent feedback, at most one
#[must_use]
pub fn check_adaptive_replan(
    plan: &WeekPlan,
    history: &[FeedbackLogEntry],
    current: NaiveDate,
) -> Vec<AdaptiveAction> {
    let config = &PlanningConfig::global().adaptive;
    let recent_hard = history
        .iter()
        .filter(|e| e.difficulty == FeedbackLabel::VeryHard)
        .filter(|e| (0..=config.window_days).contains(&(current - e.date).num_days()))
        .count();
    if recent_hard == 0 {
        return Vec::new();
    }

    let future = || plan.days().iter().filter(move |d| d.date > current);

    if recent_hard >= config.recovery_trigger_count {
        let open_day = future().find(|d| {
            d.status.is_none() && !d.sessions.iter().any(PlannedSession::is_completed)
        });
        if let Some(day) = open_day {
            return vec![AdaptiveAction::InsertRecovery {
                target_date: day.date,
                reason: format!(
                    "{recent_hard}x very_hard/fail in last {} days",
                    config.window_days
                ),
                replacement_session_id: REGENERATION.to_owned(),
            }];
        }
    }

    future()
        .find_map(|day| {
            day.sessions
                .iter()
                .find(|s| s.is_pending() && s.tags.hard)
                .map(|s| AdaptiveAction::DowngradeNextHard {
                    target_date: day.date,
                    reason: "very_hard/fail feedback: downgrade next hard session".to_owned(),
                    original_session_id: s.session_id.clone(),
                    replacement_session_id: COMPLEMENTARY.to_owned(),
                })
        })
        .into_iter()
        .collect()
}

fn adaptive_session(
    session_id: &str,
    reference: Option<&PlannedSession>,
    plan: &WeekPlan,
    explain: &[String],
) -> PlannedSession {
    let slot = reference.map_or(Slot::Evening, |s| s.slot);
    let location = reference.map_or(Location::Home, |s| s.location);
    let gym_id = reference.and_then(|s| s.gym_id.clone());
    let mut session = planned_session(session_id, slot, location, gym_id, plan.phase_id());
    session.constraints_applied.push(ADAPTIVE_CONSTRAINT.to_owned());
    session.explain = explain.iter().map(ExplainEntry::reason).collect();
    session
}

/// Apply adaptive actions to a copy of the plan and trace them
#[must_use]
pub fn apply_adaptive_replan(plan: &WeekPlan, actions: &[AdaptiveAction]) -> WeekPlan {
    let mut updated = plan.clone();
    if actions.is_empty() {
        return updated;
    }
    for action in actions {
        let Some(index) = updated
            .days()
            .iter()
            .position(|d| d.date == action.target_date())
        else {
            continue;
        };
        let replacement = match action {
            AdaptiveAction::DowngradeNextHard {
                original_session_id, ..
            } => {
                let day = &updated.days()[index];
                let Some(pos) = day.sessions.iter().position(|s| s.is_pending() && s.tags.hard)
                else {
                    continue;
                };
                let session = adaptive_session(
                    COMPLEMENTARY,
                    day.sessions.get(pos),
                    plan,
                    &[
                        "adaptive replan: downgrade hard session after very_hard feedback".to_owned(),
                        format!("original_session={original_session_id}"),
                    ],
                );
                (Some(pos), session)
            }
            AdaptiveAction::InsertRecovery { .. } => {
                let day = &updated.days()[index];
                let session = adaptive_session(
                    REGENERATION,
                    day.sessions.first(),
                    plan,
                    &["adaptive replan: recovery day after repeated very_hard feedback".to_owned()],
                );
                (None, session)
            }
        };
        let day = &mut updated.days_mut()[index];
        match replacement {
            (Some(pos), session) => day.sessions[pos] = session,
            (None, session) => day.sessions = vec![session],
        }
        debug!(date = %day.date, "adaptive action applied");
    }
    updated.weekly_load_summary = load_summary(updated.days());
    updated.adaptations.push(Adaptation::AdaptiveReplan {
        date: actions.first().map(AdaptiveAction::target_date),
        actions: actions.to_vec(),
    });
    info!(actions = actions.len(), "adaptive replan applied");
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macrocycle::session_pool;
    use crate::planner::{normalize_availability, plan_week, PlanRequest};
    use crate::training_constants::phases;
    use crux_core::models::{AvailabilityInput, Gym, PhaseId, PlanningPrefs, SessionStatus};
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn gym_week() -> WeekPlan {
        let phase = PhaseId::StrengthPower;
        let availability = normalize_availability(&AvailabilityInput::new(), &[Location::Gym]);
        let weights = phases::base_weights(phase);
        let pool = session_pool(phase);
        let gyms = vec![Gym {
            gym_id: "blocx".into(),
            priority: Some(1),
            ..Gym::default()
        }];
        plan_week(&PlanRequest {
            phase_id: phase,
            domain_weights: &weights,
            session_pool: &pool,
            start_date: date("2026-01-05"),
            availability: &availability,
            allowed_locations: &[Location::Gym, Location::Home],
            hard_cap_per_week: 3,
            planning_prefs: &PlanningPrefs::default(),
            default_gym_id: Some("blocx"),
            gyms: &gyms,
            intensity_cap: None,
            pretrip_dates: &[],
            is_last_week_of_phase: false,
        })
    }

    fn very_hard(day: &str) -> FeedbackLogEntry {
        FeedbackLogEntry {
            date: date(day),
            session_id: "strength_long".to_owned(),
            difficulty: FeedbackLabel::VeryHard,
        }
    }

    #[test]
    fn test_two_very_hard_days_insert_recovery() {
        let plan = gym_week();
        let history = [very_hard("2026-01-05"), very_hard("2026-01-06")];
        let actions = check_adaptive_replan(&plan, &history, date("2026-01-06"));
        assert_eq!(actions.len(), 1);
        let AdaptiveAction::InsertRecovery {
            target_date,
            replacement_session_id,
            ..
        } = &actions[0]
        else {
            panic!("expected insert_recovery, got {actions:?}");
        };
        assert_eq!(*target_date, date("2026-01-07"));
        assert_eq!(replacement_session_id, "regeneration_easy");

        let updated = apply_adaptive_replan(&plan, &actions);
        let day = updated.day(date("2026-01-07")).unwrap();
        assert_eq!(day.sessions.len(), 1);
        assert_eq!(day.sessions[0].session_id, "regeneration_easy");
        assert!(day.sessions[0].constraints_applied.contains(&"adaptive_replan".to_owned()));
        assert!(matches!(updated.adaptations.last(), Some(Adaptation::AdaptiveReplan { .. })));
    }

    #[test]
    fn test_single_very_hard_downgrades_next_hard() {
        let plan = gym_week();
        let next_hard = plan
            .days()
            .iter()
            .find(|d| d.date > date("2026-01-05") && d.has_hard())
            .map(|d| d.date)
            .unwrap();
        let actions = check_adaptive_replan(&plan, &[very_hard("2026-01-05")], date("2026-01-05"));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].target_date(), next_hard);

        let updated = apply_adaptive_replan(&plan, &actions);
        let day = updated.day(next_hard).unwrap();
        assert!(day.sessions.iter().any(|s| s.session_id == "complementary_conditioning"));
        assert!(updated.weekly_load_summary.total_load < plan.weekly_load_summary.total_load);
    }

    #[test]
    fn test_old_or_mild_feedback_does_nothing() {
        let plan = gym_week();
        let stale = [very_hard("2026-01-01")];
        assert!(check_adaptive_replan(&plan, &stale, date("2026-01-06")).is_empty());
        let mild = [FeedbackLogEntry {
            difficulty: FeedbackLabel::Hard,
            ..very_hard("2026-01-06")
        }];
        assert!(check_adaptive_replan(&plan, &mild, date("2026-01-06")).is_empty());
        assert_eq!(apply_adaptive_replan(&plan, &[]), plan);
    }

    #[test]
    fn test_recovery_skips_days_with_completed_sessions() {
        let mut plan = gym_week();
        if let Some(day) = plan.day_mut(date("2026-01-07")) {
            day.status = Some(SessionStatus::Done);
        }
        let history = [very_hard("2026-01-05"), very_hard("2026-01-06")];
        let actions = check_adaptive_replan(&plan, &history, date("2026-01-06"));
        assert_eq!(actions[0].target_date(), date("2026-01-08"));
    }

    #[test]
    fn test_difficulty_is_fatigue_weighted() {
        let catalog = Catalog::new(
            serde_json::from_value(json!([
                {"id": "max_hang_5s", "fatigue_cost": 9},
                {"id": "plank", "fatigue_cost": 1}
            ]))
            .unwrap(),
            Vec::new(),
            Vec::new(),
        );
        let log: SessionLogEntry = serde_json::from_value(json!({
            "date": "2026-01-05",
            "actual": {"exercise_feedback_v1": [
                {"exercise_id": "max_hang_5s", "feedback_label": "very_hard"},
                {"exercise_id": "plank", "feedback_label": "very_easy"}
            ]}
        }))
        .unwrap();
        assert_eq!(session_difficulty(&log, &catalog), FeedbackLabel::VeryHard);

        let empty: SessionLogEntry = serde_json::from_value(json!({"date": "2026-01-05"})).unwrap();
        assert_eq!(session_difficulty(&empty, &catalog), FeedbackLabel::Ok);

        let mut state = UserState::empty();
        append_feedback_log(&mut state, &log, None, &catalog);
        assert_eq!(state.feedback_log[0].session_id, "unknown");
        assert_eq!(state.feedback_log[0].difficulty, FeedbackLabel::VeryHard);
    }
}
