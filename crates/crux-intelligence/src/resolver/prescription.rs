// ABOUTME: Prescription merging for resolved exercises: defaults, block overlay, manual overrides
// ABOUTME: Applies the cooldown load downshift and counts down occurrence-limited overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::models::{ExerciseOverride, OverrideMode, Overrides, Prescription, ResolvedSession};
use serde_json::{json, Value};
use tracing::debug;

/// Key holding the prescribed load
pub const LOAD_KEY: &str = "load_kg";
/// Key holding the cooldown load multiplier
pub const MULTIPLIER_KEY: &str = "multiplier";

const OCCURRENCES: &str = "occurrences";

/// Round to the nearest half kilogram
#[must_use]
pub fn round_to_step(value: f64) -> f64 {
    (value / 0.5).round_ties_even() * 0.5
}

/// Exercise defaults overlaid with the block prescription
#[must_use]
pub fn merge(defaults: &Prescription, block: &Prescription) -> Prescription {
    let mut merged = defaults.clone();
    for (key, value) in block {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Scale the load fields for a cluster cooldown downshift
pub fn apply_downshift(prescription: &mut Prescription, multiplier: f64) {
    let current = prescription
        .get(MULTIPLIER_KEY)
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    prescription.insert(MULTIPLIER_KEY.to_owned(), json!(current * multiplier));
    if let Some(load) = prescription.get(LOAD_KEY).and_then(Value::as_f64) {
        prescription.insert(LOAD_KEY.to_owned(), json!(round_to_step(load * multiplier)));
    }
}

/// Apply a manual override to the prescribed load
///
/// Returns whether the override changed anything. Prescriptions without a
/// numeric load are left alone.
pub fn apply_override(prescription: &mut Prescription, rule: &ExerciseOverride) -> bool {
    let Some(base) = prescription.get(LOAD_KEY).and_then(Value::as_f64) else {
        return false;
    };
    let adjusted = match rule.mode {
        OverrideMode::AbsoluteLoadKg => rule.value,
        OverrideMode::DeltaKg => base + rule.value,
        OverrideMode::Multiplier => base * rule.value,
    };
    prescription.insert(LOAD_KEY.to_owned(), json!(round_to_step(adjusted)));
    true
}

/// Count down occurrence-limited overrides used by a resolved session
///
/// Every instance carrying a load whose exercise has an override consumes
/// one occurrence; overrides reaching zero are removed.
pub fn consume_overrides(overrides: &mut Overrides, resolved: &ResolvedSession) {
    for instance in resolved.instances() {
        if !instance.prescription.contains_key(LOAD_KEY) {
            continue;
        }
        let Some(rule) = overrides.per_exercise.get_mut(&instance.exercise_id) else {
            continue;
        };
        let Some(expiry) = rule.expires.as_mut().filter(|e| e.kind == OCCURRENCES) else {
            continue;
        };
        expiry.n -= 1;
        if expiry.n <= 0 {
            overrides.per_exercise.remove(&instance.exercise_id);
            debug!(exercise_id = %instance.exercise_id, "override expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prescription(value: serde_json::Value) -> Prescription {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_block_overlay_wins() {
        let merged = merge(
            &prescription(json!({"sets": 3, "load_kg": 10.0})),
            &prescription(json!({"sets": 5})),
        );
        assert_eq!(merged["sets"], 5);
        assert_eq!(merged["load_kg"], 10.0);
    }

    #[test]
    fn test_override_modes() {
        let mut p = prescription(json!({"load_kg": 20.0}));
        let rule = |mode, value| ExerciseOverride {
            mode,
            value,
            expires: None,
        };
        assert!(apply_override(&mut p, &rule(OverrideMode::DeltaKg, 2.3)));
        assert_eq!(p["load_kg"], 22.5);
        apply_override(&mut p, &rule(OverrideMode::Multiplier, 0.5));
        assert_eq!(p["load_kg"], 11.0);
        apply_override(&mut p, &rule(OverrideMode::AbsoluteLoadKg, 7.0));
        assert_eq!(p["load_kg"], 7.0);
        let mut no_load = prescription(json!({"sets": 3}));
        assert!(!apply_override(&mut no_load, &rule(OverrideMode::DeltaKg, 1.0)));
    }

    #[test]
    fn test_downshift_scales_load_and_multiplier() {
        let mut p = prescription(json!({"load_kg": 20.0}));
        apply_downshift(&mut p, 0.9);
        assert_eq!(p["load_kg"], 18.0);
        assert!((p["multiplier"].as_f64().unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_to_half_step() {
        assert!((round_to_step(2.26) - 2.5).abs() < f64::EPSILON);
        assert!((round_to_step(2.24) - 2.0).abs() < f64::EPSILON);
        assert!((round_to_step(-3.3) + 3.5).abs() < f64::EPSILON);
    }
}
