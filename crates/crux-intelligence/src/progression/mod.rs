// ABOUTME: Progression engine turning per-exercise feedback into next loads, grades, and retests
// ABOUTME: Working-load upserts, max hang streak counters, test queue, and test promotion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Progression
//!
//! Two directions over the same working-load table:
//!
//! - [`inject_targets`] reads it to annotate resolved exercises
//! - [`apply_feedback`] writes it from a logged day
//!
//! Every load is snapped to the half-kilogram grid before it is stored.

/// Setup keys, freshness and half-kilogram snapping
pub mod setup_key;
/// Suggested targets for resolved sessions
pub mod targets;

use chrono::NaiveDate;
use crux_core::dates::add_days;
use crux_core::grades::{step_font_grade, Grade, GradeScale};
use crux_core::models::{
    ExerciseFeedback, FeedbackLabel, HangboardBaseline, MaxStrengthTest, SessionLogEntry,
    TestQueueItem, UserState, WorkingLoadEntry,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::PlanningConfig;
use crate::training_constants::progression::{
    is_grade_based, is_load_based, EASY_STREAK_REASON, HARD_STREAK_REASON, MAX_HANG,
    MAX_HANG_TEST_ID, TEST_STALE_AFTER_DAYS,
};
use setup_key::{relevant_setup, round_half, setup_key as key_for};

pub use targets::{inject_session_targets, inject_targets};

/// Midpoint adjustment for a label from the user's policy; 0 when missing
#[must_use]
pub fn midpoint_pct(state: &UserState, label: FeedbackLabel) -> f64 {
    state
        .working_loads
        .rules
        .adjustment_policy
        .get(&label)
        .map_or(0.0, |rule| rule.midpoint())
}

fn existing_or_new(state: &UserState, exercise_id: &str, key: &str) -> WorkingLoadEntry {
    state
        .working_loads
        .entry(key)
        .filter(|e| e.exercise_id == exercise_id)
        .cloned()
        .unwrap_or_else(|| WorkingLoadEntry {
            exercise_id: exercise_id.to_owned(),
            key: key.to_owned(),
            ..WorkingLoadEntry::default()
        })
}

fn setup_source(prescription: Option<&Map<String, Value>>, item: &ExerciseFeedback) -> Map<String, Value> {
    let mut source = prescription.cloned().unwrap_or_default();
    for (k, v) in &item.extra {
        source.insert(k.clone(), v.clone());
    }
    if let Some(surface) = &item.surface_selected {
        source.insert("surface_selected".to_owned(), Value::String(surface.clone()));
    }
    source
}

/// Max hang streaks carried across feedback items
#[derive(Debug, Clone, Copy, Default)]
struct Streaks {
    hard: u32,
    easy: u32,
}

impl Streaks {
    fn observe(&mut self, label: FeedbackLabel) {
        match label {
            FeedbackLabel::Hard | FeedbackLabel::VeryHard => {
                self.hard += 1;
                self.easy = 0;
            }
            FeedbackLabel::Easy | FeedbackLabel::VeryEasy => {
                self.easy += 1;
                self.hard = 0;
            }
            FeedbackLabel::Ok => {
                self.hard = 0;
                self.easy = 0;
            }
        }
    }
}

fn apply_load_feedback(
    state: &mut UserState,
    log_entry: &SessionLogEntry,
    item: &ExerciseFeedback,
    label: FeedbackLabel,
    bodyweight: f64,
) -> bool {
    let (used_total, used_external) = match (item.used_total_load_kg, item.used_external_load_kg) {
        (Some(total), Some(external)) => (total, external),
        (Some(total), None) => (total, total - bodyweight),
        (None, Some(external)) => (external + bodyweight, external),
        (None, None) => return false,
    };
    let pct = midpoint_pct(state, label);
    let prescription = log_entry
        .planned_instance(&item.exercise_id)
        .map(|(_, inst)| &inst.prescription);
    let setup = relevant_setup(&item.exercise_id, &setup_source(prescription, item));
    let key = key_for(&item.exercise_id, &setup);

    let mut entry = existing_or_new(state, &item.exercise_id, &key);
    entry.setup = setup;
    entry.last_completed = Some(item.completed);
    entry.last_feedback_label = Some(label);
    entry.last_external_load_kg = Some(round_half(used_external));
    entry.last_total_load_kg = Some(round_half(used_total));
    entry.next_external_load_kg = Some(round_half(used_external * (1.0 + pct)));
    entry.next_total_load_kg = Some(round_half(used_total * (1.0 + pct)));
    entry.updated_at = Some(log_entry.date);
    debug!(key = %entry.key, label = %label, next = ?entry.next_external_load_kg, "working load updated");
    state.working_loads.upsert(entry);
    true
}

fn apply_grade_feedback(
    state: &mut UserState,
    log_entry: &SessionLogEntry,
    item: &ExerciseFeedback,
    label: FeedbackLabel,
) -> bool {
    let Some(used) = item
        .used_grade
        .as_deref()
        .and_then(|g| Grade::parse_on(GradeScale::Font, g).ok())
    else {
        return false;
    };
    let planned = log_entry.planned_instance(&item.exercise_id);
    let planned_target = planned
        .and_then(|(_, inst)| inst.suggested.as_ref())
        .and_then(|s| s.suggested_boulder_target.as_ref());
    let options = planned_target.map_or_else(
        || targets::surface_options(state, planned.and_then(|(s, _)| s.gym_id.as_deref())),
        |t| t.surface_options.clone(),
    );
    let preferred = item
        .surface_selected
        .as_deref()
        .or_else(|| planned_target.map(|t| t.surface_selected.as_str()));
    let surface = targets::select_surface(preferred, &options);

    let mut source = Map::new();
    source.insert("surface".to_owned(), Value::String(surface.clone()));
    let setup = relevant_setup(&item.exercise_id, &source);
    let key = key_for(&item.exercise_id, &setup);
    let next = step_font_grade(used.label(), label.grade_delta(), used);

    let mut entry = existing_or_new(state, &item.exercise_id, &key);
    entry.setup = setup;
    entry.surface_selected = Some(surface);
    entry.last_feedback_label = Some(label);
    entry.last_used_grade = Some(used.label().to_owned());
    entry.next_target_grade = Some(next.label().to_owned());
    entry.updated_at = Some(log_entry.date);
    debug!(key = %entry.key, next_grade = next.label(), "grade target updated");
    state.working_loads.upsert(entry);
    true
}

fn enqueue_retest(state: &mut UserState, date: NaiveDate, streaks: Streaks) {
    let config = &PlanningConfig::global().progression;
    let (offset, reason) = if streaks.hard >= config.streak_threshold {
        (config.hard_retest_offset_days, HARD_STREAK_REASON)
    } else if streaks.easy >= config.streak_threshold {
        (config.easy_retest_offset_days, EASY_STREAK_REASON)
    } else {
        return;
    };
    let item = TestQueueItem {
        test_id: MAX_HANG_TEST_ID.to_owned(),
        recommended_by_date: add_days(date, offset),
        reason: reason.to_owned(),
        created_at: date,
    };
    if state.enqueue_test(item, config.test_dedupe_days) {
        info!(%date, reason, "retest enqueued");
    }
}

fn promote_test_results(state: &mut UserState, log_entry: &SessionLogEntry, bodyweight: f64) {
    if !log_entry.is_test_day() {
        return;
    }
    for item in log_entry.feedback() {
        if item.exercise_id != MAX_HANG {
            continue;
        }
        let Some(used_total) = item.used_total_load_kg else {
            continue;
        };
        let total = round_half(used_total);
        let mut setup = Map::new();
        setup.insert("hang_seconds".to_owned(), json!(5));
        state.tests.record_max_strength(MaxStrengthTest {
            test_id: MAX_HANG_TEST_ID.to_owned(),
            date: log_entry.date,
            exercise_id: MAX_HANG.to_owned(),
            bodyweight_kg: Some(bodyweight),
            total_load_kg: total,
            external_load_kg: Some(round_half(total - bodyweight)),
            setup,
            freshness_policy: json!({"stale_after_days": TEST_STALE_AFTER_DAYS}),
            confidence: "high".to_owned(),
        });
        match state.baselines.hangboard.first_mut() {
            Some(baseline) => baseline.max_total_load_kg = Some(total),
            None => state.baselines.hangboard.push(HangboardBaseline {
                max_total_load_kg: Some(total),
                ..HangboardBaseline::default()
            }),
        }
        info!(date = %log_entry.date, total, "max hang test promoted to baseline");
    }
}

/// Apply a logged day's feedback to a copy of the user state
///
/// Load-based exercises get their next loads from the label's midpoint
/// adjustment; grade-based ones step the grade. Two hard (or easy) max
/// hang labels in a row enqueue a retest, and a test day promotes its
/// result into the baselines.
#[must_use]
pub fn apply_feedback(log_entry: &SessionLogEntry, state: &UserState) -> UserState {
    let mut updated = state.clone();
    let bodyweight = updated.bodyweight().unwrap_or(0.0);
    let mut streaks = Streaks {
        hard: updated.progression_counters.max_hang_5s_hard_streak,
        easy: updated.progression_counters.max_hang_5s_easy_streak,
    };
    let mut applied = 0_usize;

    for item in log_entry.feedback() {
        if item.exercise_id.trim().is_empty() {
            continue;
        }
        let label = item.label();
        if is_load_based(&item.exercise_id) {
            if !apply_load_feedback(&mut updated, log_entry, item, label, bodyweight) {
                continue;
            }
            if item.exercise_id == MAX_HANG {
                streaks.observe(label);
            }
            applied += 1;
        } else if is_grade_based(&item.exercise_id)
            && apply_grade_feedback(&mut updated, log_entry, item, label)
        {
            applied += 1;
        }
    }

    updated.progression_counters.max_hang_5s_hard_streak = streaks.hard;
    updated.progression_counters.max_hang_5s_easy_streak = streaks.easy;
    enqueue_retest(&mut updated, log_entry.date, streaks);
    promote_test_results(&mut updated, log_entry, bodyweight);
    info!(date = %log_entry.date, applied, "feedback applied");
    updated
}
