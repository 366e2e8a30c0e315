// ABOUTME: Target injection annotating resolved exercises with suggested loads and grades
// ABOUTME: Max hangs from baselines or working loads, pull-ups from working loads, boulders from benchmarks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::grades::{step_font_grade, Grade, GradeScale};
use crux_core::models::{
    tag_is_set, BoulderTarget, Prescription, ResolvedDay, ResolvedSession, SuggestedTargets,
    UserState, BOULDER_TARGET_SCHEMA_VERSION, TARGETS_SCHEMA_VERSION,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::setup_key::{best_entry, relevant_setup, round_half, value_text};
use crate::config::PlanningConfig;
use crate::training_constants::progression::{
    DEFAULT_BENCHMARK_GRADE, DEFAULT_MAX_HANG_INTENSITY, DEFAULT_SURFACE, LIMIT_BOULDERING,
    MAX_HANG, SURFACE_PRIORITY,
};

const EASY_INTENTS: [&str; 4] = ["warmup", "technique", "recovery", "accessory"];
const VOLUME_INTENTS: [&str; 4] = ["power_endurance", "aerobic_endurance", "endurance", "volume"];
const LIMIT_INTENTS: [&str; 2] = ["power", "limit"];

/// Session-level facts that shape every instance's targets
struct SessionFacts<'a> {
    intent: String,
    tags: &'a Value,
    gym_id: Option<&'a str>,
    date: Option<NaiveDate>,
}

impl SessionFacts<'_> {
    fn is_easy(&self) -> bool {
        EASY_INTENTS.contains(&self.intent.as_str()) || tag_is_set(self.tags, "technique")
    }

    fn is_volume(&self) -> bool {
        VOLUME_INTENTS.contains(&self.intent.as_str()) || tag_is_set(self.tags, "volume")
    }

    fn intensity_label(&self) -> &'static str {
        if self.is_easy() {
            "easy"
        } else if self.is_volume() {
            "medium"
        } else {
            "hard"
        }
    }

    fn boulder_offset(&self, state: &UserState) -> i32 {
        let offsets = &state.progression_config.boulder_targets.offsets;
        if self.is_easy() {
            offsets.warmup_tech
        } else if self.is_volume() {
            offsets.volume
        } else if LIMIT_INTENTS.contains(&self.intent.as_str()) || tag_is_set(self.tags, "hard") {
            offsets.limit_power
        } else {
            offsets.default
        }
    }
}

fn normalized_intent(intent: Option<&str>) -> String {
    intent.map(|i| i.trim().to_lowercase()).unwrap_or_default()
}

/// Boulder surfaces the gym offers, in priority order
#[must_use]
pub fn surface_options(state: &UserState, gym_id: Option<&str>) -> Vec<String> {
    let Some(gym) = gym_id.and_then(|id| {
        state
            .equipment
            .gyms
            .iter()
            .find(|g| g.gym_id.trim().eq_ignore_ascii_case(id.trim()))
    }) else {
        return Vec::new();
    };
    SURFACE_PRIORITY
        .iter()
        .filter(|surface| gym.equipment.iter().any(|e| e.trim().eq_ignore_ascii_case(surface)))
        .map(|s| (*s).to_owned())
        .collect()
}

/// Preferred surface when it is a known one, else the first option, else the default
#[must_use]
pub fn select_surface(preferred: Option<&str>, options: &[String]) -> String {
    let preferred = preferred.map(|p| p.trim().to_lowercase()).unwrap_or_default();
    if SURFACE_PRIORITY.contains(&preferred.as_str()) {
        return preferred;
    }
    options
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_SURFACE.to_owned())
}

fn benchmark_grade(state: &UserState) -> Option<Grade> {
    state
        .boulder_benchmark_grade()
        .and_then(|g| Grade::parse_on(GradeScale::Font, g).ok())
        .or_else(|| Grade::parse_on(GradeScale::Font, DEFAULT_BENCHMARK_GRADE).ok())
}

fn scalar(prescription: &Prescription, key: &str, range_key: &str) -> Option<String> {
    prescription
        .get(key)
        .and_then(value_text)
        .or_else(|| {
            prescription
                .get(range_key)
                .and_then(Value::as_array)
                .and_then(|r| r.first())
                .and_then(value_text)
        })
}

fn max_hang_targets(
    state: &UserState,
    facts: &SessionFacts<'_>,
    prescription: &Prescription,
    suggested: &mut SuggestedTargets,
) {
    let bodyweight = state.bodyweight().unwrap_or(0.0);
    let intensity = prescription
        .get("intensity_pct_of_total_load")
        .and_then(Value::as_f64)
        .filter(|p| *p > 0.0)
        .unwrap_or(DEFAULT_MAX_HANG_INTENSITY);
    let max_total = state
        .baselines
        .hangboard
        .first()
        .and_then(|b| b.max_total_load_kg)
        .filter(|m| *m > 0.0)
        .unwrap_or(bodyweight);
    let mut total = round_half(max_total * intensity);
    let mut external = round_half(total - bodyweight);

    let mut source = prescription.clone();
    if let Some(edge) = suggested.edge_mm {
        source.insert("edge_mm".to_owned(), Value::from(edge));
    }
    if let Some(grip) = &suggested.grip {
        source.insert("grip".to_owned(), Value::String(grip.clone()));
    }
    if let Some(method) = &suggested.load_method {
        source.insert("load_method".to_owned(), Value::String(method.clone()));
    }
    let setup = relevant_setup(MAX_HANG, &source);
    let freshness = PlanningConfig::global().progression.working_load_freshness_days;
    if let Some(entry) = best_entry(&state.working_loads, MAX_HANG, &setup, facts.date, freshness) {
        if let Some(next_external) = entry.next_external_load_kg {
            external = round_half(next_external);
            total = round_half(bodyweight + external);
        } else if let Some(next_total) = entry.next_total_load_kg {
            total = round_half(next_total);
            external = round_half(total - bodyweight);
        }
    }

    let sets = scalar(prescription, "sets", "sets_range").unwrap_or_else(|| "6".to_owned());
    let seconds = ["hang_seconds", "work_seconds"]
        .iter()
        .find_map(|k| prescription.get(*k).and_then(value_text))
        .unwrap_or_else(|| "5".to_owned());
    suggested.suggested_total_load_kg = Some(total);
    suggested.suggested_external_load_kg = Some(external);
    suggested.suggested_rep_scheme = Some(format!("{sets}x{seconds}s"));
    suggested.edge_mm = setup
        .get("edge_mm")
        .and_then(Value::as_u64)
        .and_then(|e| u32::try_from(e).ok())
        .or(suggested.edge_mm);
    if let Some(grip) = setup.get("grip").and_then(Value::as_str) {
        suggested.grip = Some(grip.to_owned());
    }
    if let Some(method) = setup.get("load_method").and_then(Value::as_str) {
        suggested.load_method = Some(method.to_owned());
    }
}

fn pullup_targets(
    state: &UserState,
    facts: &SessionFacts<'_>,
    exercise_id: &str,
    prescription: &Prescription,
    suggested: &mut SuggestedTargets,
) {
    let freshness = PlanningConfig::global().progression.working_load_freshness_days;
    let next_external = best_entry(
        &state.working_loads,
        exercise_id,
        &relevant_setup(exercise_id, prescription),
        facts.date,
        freshness,
    )
    .and_then(|e| e.next_external_load_kg)
    .unwrap_or(0.0);
    let reps = scalar(prescription, "reps", "reps_range").unwrap_or_else(|| "5".to_owned());
    let sets = scalar(prescription, "sets", "sets_range").unwrap_or_else(|| "4".to_owned());
    suggested.suggested_external_load_kg = Some(round_half(next_external));
    suggested.suggested_rep_scheme = Some(format!("{sets}x{reps}"));
}

fn boulder_target(state: &UserState, facts: &SessionFacts<'_>) -> Option<BoulderTarget> {
    let options = surface_options(state, facts.gym_id);
    let surface = select_surface(None, &options);
    let fallback = benchmark_grade(state)?;
    let mut target = step_font_grade(fallback.label(), facts.boulder_offset(state), fallback);

    let mut source = Map::new();
    source.insert("surface".to_owned(), Value::String(surface.clone()));
    let setup = relevant_setup(LIMIT_BOULDERING, &source);
    let freshness = PlanningConfig::global().progression.working_load_freshness_days;
    if let Some(next) = best_entry(&state.working_loads, LIMIT_BOULDERING, &setup, facts.date, freshness)
        .and_then(|e| e.next_target_grade.as_deref())
        .and_then(|g| Grade::parse_on(GradeScale::Font, g).ok())
    {
        target = next;
    }

    Some(BoulderTarget {
        schema_version: BOULDER_TARGET_SCHEMA_VERSION.to_owned(),
        surface_options: options,
        surface_selected: surface,
        target_grade: target.label().to_owned(),
        intensity_label: facts.intensity_label().to_owned(),
    })
}

/// Targets for one instance; `None` when the exercise is not progressed
fn suggest(
    state: &UserState,
    facts: &SessionFacts<'_>,
    exercise_id: &str,
    prescription: &Prescription,
    existing: Option<&SuggestedTargets>,
) -> Option<SuggestedTargets> {
    let mut suggested = existing.cloned().unwrap_or_default();
    match exercise_id {
        MAX_HANG => max_hang_targets(state, facts, prescription, &mut suggested),
        "pullup" | "weighted_pullup" => {
            pullup_targets(state, facts, exercise_id, prescription, &mut suggested);
        }
        LIMIT_BOULDERING => suggested.suggested_boulder_target = boulder_target(state, facts),
        _ => return existing.cloned(),
    }
    suggested.schema_version = Some(TARGETS_SCHEMA_VERSION.to_owned());
    debug!(exercise_id, "targets injected");
    Some(suggested)
}

/// Annotate every progressed instance of a resolved day with suggested targets
#[must_use]
pub fn inject_targets(day: &ResolvedDay, state: &UserState) -> ResolvedDay {
    let mut out = day.clone();
    for session in &mut out.sessions {
        let facts = SessionFacts {
            intent: normalized_intent(session.intent.as_deref()),
            tags: &session.tags,
            gym_id: session.gym_id.as_deref(),
            date: Some(day.date),
        };
        for instance in &mut session.exercise_instances {
            instance.suggested = suggest(
                state,
                &facts,
                &instance.exercise_id,
                &instance.prescription,
                instance.suggested.as_ref(),
            );
        }
    }
    out
}

/// Annotate a freshly resolved session in place
///
/// The freshness window is measured from the context's target date; a
/// session resolved without a date only gets baseline-derived targets.
pub fn inject_session_targets(resolved: &mut ResolvedSession, state: &UserState) {
    let intent = normalized_intent(resolved.session.intent.as_deref());
    let tags = resolved.session.tags.clone();
    let gym_id = resolved.context.gym_id.clone();
    let facts = SessionFacts {
        intent,
        tags: &tags,
        gym_id: gym_id.as_deref(),
        date: resolved.context.target_date,
    };
    for instance in resolved.instances_mut() {
        instance.suggested = suggest(
            state,
            &facts,
            &instance.exercise_id,
            &instance.prescription,
            instance.suggested.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> UserState {
        serde_json::from_value(value).unwrap()
    }

    fn day(value: Value) -> ResolvedDay {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_max_hang_from_baseline() {
        let state = state(json!({
            "bodyweight_kg": 70.0,
            "baselines": {"hangboard": [{"max_total_load_kg": 100.0}]}
        }));
        let out = inject_targets(
            &day(json!({
                "date": "2026-01-05",
                "sessions": [{"session_id": "strength_long", "exercise_instances": [
                    {"exercise_id": "max_hang_5s", "prescription": {"sets": 6, "intensity_pct_of_total_load": 0.85}}
                ]}]
            })),
            &state,
        );
        let suggested = out.sessions[0].exercise_instances[0].suggested.clone().unwrap();
        assert_eq!(suggested.suggested_total_load_kg, Some(85.0));
        assert_eq!(suggested.suggested_external_load_kg, Some(15.0));
        assert_eq!(suggested.suggested_rep_scheme.as_deref(), Some("6x5s"));
        assert_eq!(suggested.schema_version.as_deref(), Some(TARGETS_SCHEMA_VERSION));
    }

    #[test]
    fn test_fresh_working_load_wins_over_baseline() {
        let state = state(json!({
            "bodyweight_kg": 70.0,
            "baselines": {"hangboard": [{"max_total_load_kg": 100.0}]},
            "working_loads": {"entries": [{
                "exercise_id": "max_hang_5s", "key": "max_hang_5s|edge_mm=20",
                "setup": {"edge_mm": 20}, "next_external_load_kg": 18.0, "updated_at": "2026-01-01"
            }]}
        }));
        let out = inject_targets(
            &day(json!({
                "date": "2026-01-05",
                "sessions": [{"session_id": "strength_long", "exercise_instances": [
                    {"exercise_id": "max_hang_5s", "prescription": {"edge_mm": 20}}
                ]}]
            })),
            &state,
        );
        let suggested = out.sessions[0].exercise_instances[0].suggested.clone().unwrap();
        assert_eq!(suggested.suggested_external_load_kg, Some(18.0));
        assert_eq!(suggested.suggested_total_load_kg, Some(88.0));
        assert_eq!(suggested.edge_mm, Some(20));
    }

    #[test]
    fn test_limit_bouldering_surface_and_grade() {
        let state = state(json!({
            "equipment": {"gyms": [{"gym_id": "blocx", "equipment": ["spraywall", "board_kilter"]}]},
            "performance": {"gym_reference": {"kilter": {"benchmark": {"grade": "7a"}}}}
        }));
        let out = inject_targets(
            &day(json!({
                "date": "2026-01-05",
                "sessions": [{"session_id": "power_gym", "intent": "power", "gym_id": "blocx",
                    "exercise_instances": [{"exercise_id": "limit_bouldering"}]}]
            })),
            &state,
        );
        let target = out.sessions[0].exercise_instances[0]
            .suggested
            .clone()
            .unwrap()
            .suggested_boulder_target
            .unwrap();
        assert_eq!(target.surface_options, ["board_kilter", "spraywall"]);
        assert_eq!(target.surface_selected, "board_kilter");
        assert_eq!(target.target_grade, "7A");
        assert_eq!(target.intensity_label, "hard");
    }

    #[test]
    fn test_boulder_offsets_follow_intent() {
        let state = state(json!({}));
        let out = inject_targets(
            &day(json!({
                "date": "2026-01-05",
                "sessions": [{"session_id": "technique_focus_gym", "intent": "technique",
                    "exercise_instances": [{"exercise_id": "limit_bouldering"}]}]
            })),
            &state,
        );
        let target = out.sessions[0].exercise_instances[0]
            .suggested
            .clone()
            .unwrap()
            .suggested_boulder_target
            .unwrap();
        assert_eq!(target.target_grade, "6B");
        assert_eq!(target.surface_selected, "gym_boulder");
        assert_eq!(target.intensity_label, "easy");
    }

    #[test]
    fn test_pullup_scheme_and_untouched_exercises() {
        let state = state(json!({}));
        let out = inject_targets(
            &day(json!({
                "date": "2026-01-05",
                "sessions": [{"session_id": "pull", "exercise_instances": [
                    {"exercise_id": "weighted_pullup", "prescription": {"sets_range": [3, 5], "reps": 4}},
                    {"exercise_id": "plank"}
                ]}]
            })),
            &state,
        );
        let instances = &out.sessions[0].exercise_instances;
        let suggested = instances[0].suggested.clone().unwrap();
        assert_eq!(suggested.suggested_rep_scheme.as_deref(), Some("3x4"));
        assert_eq!(suggested.suggested_external_load_kg, Some(0.0));
        assert!(instances[1].suggested.is_none());
    }
}
