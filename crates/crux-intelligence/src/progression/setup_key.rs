// ABOUTME: Canonical setup subsets and keys identifying working-load entries
// ABOUTME: Half-kilogram snapping and freshness-aware lookup of the best matching entry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::models::{WorkingLoadEntry, WorkingLoads};
use serde_json::{Map, Value};

use crate::training_constants::progression::{LIMIT_BOULDERING, MAX_HANG};

/// Setup fields relevant to a working-load entry
pub type Setup = Map<String, Value>;

const MAX_HANG_FIELDS: [&str; 3] = ["edge_mm", "grip", "load_method"];
const SURFACE: &str = "surface";

/// Snap down to the half-kilogram grid
///
/// Snapping an already snapped value is a no-op, so feedback applied twice
/// with the same input writes the same loads.
#[must_use]
pub fn round_half(value: f64) -> f64 {
    (value / 0.5 + 1e-9).floor() * 0.5
}

/// Text form of a setup value; `None` for nulls and blank strings
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Exercise-specific setup subset of `source`
///
/// Max hangs keep edge depth, grip and load method; limit bouldering keeps
/// the surface (`surface_selected` wins over `surface`). Other exercises
/// have an empty setup.
#[must_use]
pub fn relevant_setup(exercise_id: &str, source: &Map<String, Value>) -> Setup {
    let mut setup = Setup::new();
    if exercise_id == MAX_HANG {
        for field in MAX_HANG_FIELDS {
            if let Some(value) = source.get(field).filter(|v| value_text(v).is_some()) {
                setup.insert(field.to_owned(), value.clone());
            }
        }
    } else if exercise_id == LIMIT_BOULDERING {
        let surface = ["surface_selected", SURFACE]
            .iter()
            .find_map(|k| source.get(*k).and_then(value_text));
        if let Some(surface) = surface {
            setup.insert(SURFACE.to_owned(), Value::String(surface.to_lowercase()));
        }
    }
    setup
}

/// Canonical key: `exercise_id|k=v|...` over the non-empty setup fields
#[must_use]
pub fn setup_key(exercise_id: &str, setup: &Setup) -> String {
    let fields: &[&str] = if exercise_id == MAX_HANG {
        &MAX_HANG_FIELDS
    } else if exercise_id == LIMIT_BOULDERING {
        &[SURFACE]
    } else {
        &[]
    };
    let pairs: Vec<String> = fields
        .iter()
        .filter_map(|field| {
            setup
                .get(*field)
                .and_then(value_text)
                .map(|v| format!("{field}={v}"))
        })
        .collect();
    if pairs.is_empty() {
        exercise_id.to_owned()
    } else {
        format!("{exercise_id}|{}", pairs.join("|"))
    }
}

/// Whether an entry updated on `updated_at` is usable on `target`
#[must_use]
pub fn is_fresh(updated_at: Option<NaiveDate>, target: NaiveDate, freshness_days: i64) -> bool {
    updated_at.is_some_and(|updated| (0..=freshness_days).contains(&(target - updated).num_days()))
}

/// Freshest entry for the exercise and setup
///
/// Fresh entries with the exact key win, latest update first. Without a
/// meaningful setup, a lone fresh entry for the exercise is accepted.
#[must_use]
pub fn best_entry<'s>(
    loads: &'s WorkingLoads,
    exercise_id: &str,
    setup: &Setup,
    target: Option<NaiveDate>,
    freshness_days: i64,
) -> Option<&'s WorkingLoadEntry> {
    let target = target?;
    let key = setup_key(exercise_id, setup);
    let fresh: Vec<&WorkingLoadEntry> = loads
        .entries
        .iter()
        .filter(|e| e.exercise_id == exercise_id)
        .filter(|e| is_fresh(e.updated_at, target, freshness_days))
        .collect();
    let matching = fresh
        .iter()
        .copied()
        .filter(|e| e.key == key)
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.key.cmp(&b.key)));
    if matching.is_some() {
        return matching;
    }
    let meaningful = setup.values().any(|v| value_text(v).is_some());
    match fresh.as_slice() {
        [only] if !meaningful => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_key_ignores_irrelevant_fields() {
        let a = relevant_setup(
            MAX_HANG,
            &map(json!({"edge_mm": 20, "grip": "half_crimp", "sets": 6, "notes": "x"})),
        );
        let b = relevant_setup(MAX_HANG, &map(json!({"grip": "half_crimp", "edge_mm": 20, "load_method": ""})));
        assert_eq!(setup_key(MAX_HANG, &a), "max_hang_5s|edge_mm=20|grip=half_crimp");
        assert_eq!(setup_key(MAX_HANG, &a), setup_key(MAX_HANG, &b));
        assert_eq!(setup_key("pullup", &Setup::new()), "pullup");
    }

    #[test]
    fn test_surface_setup_prefers_selected() {
        let setup = relevant_setup(
            LIMIT_BOULDERING,
            &map(json!({"surface": "spraywall", "surface_selected": "Board_Kilter"})),
        );
        assert_eq!(setup_key(LIMIT_BOULDERING, &setup), "limit_bouldering|surface=board_kilter");
    }

    #[test]
    fn test_round_half_snaps_down_and_is_stable() {
        assert!((round_half(10.8) - 10.5).abs() < f64::EPSILON);
        assert!((round_half(10.5) - 10.5).abs() < f64::EPSILON);
        assert!((round_half(round_half(7.49)) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_best_entry_respects_freshness_and_setup() {
        let loads: WorkingLoads = serde_json::from_value(json!({
            "entries": [
                {"exercise_id": "max_hang_5s", "key": "max_hang_5s|edge_mm=20", "setup": {"edge_mm": 20},
                 "next_external_load_kg": 10.0, "updated_at": "2026-01-01"},
                {"exercise_id": "max_hang_5s", "key": "max_hang_5s|edge_mm=15", "setup": {"edge_mm": 15},
                 "next_external_load_kg": 4.0, "updated_at": "2025-09-01"}
            ]
        }))
        .unwrap();
        let edge20 = map(json!({"edge_mm": 20}));
        let hit = best_entry(&loads, MAX_HANG, &edge20, Some(date("2026-02-01")), 60).unwrap();
        assert_eq!(hit.next_external_load_kg, Some(10.0));
        assert!(best_entry(&loads, MAX_HANG, &edge20, Some(date("2026-04-01")), 60).is_none());

        let edge15 = map(json!({"edge_mm": 15}));
        assert!(best_entry(&loads, MAX_HANG, &edge15, Some(date("2026-02-01")), 60).is_none());

        let lone = best_entry(&loads, MAX_HANG, &Setup::new(), Some(date("2026-02-01")), 60).unwrap();
        assert_eq!(lone.key, "max_hang_5s|edge_mm=20");
        assert!(best_entry(&loads, MAX_HANG, &edge20, None, 60).is_none());
    }
}
