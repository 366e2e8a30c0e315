// ABOUTME: Cluster keys grouping interchangeable exercises for cooldown tracking
// ABOUTME: Finds a same-family substitute when the selected exercise's cluster is cooling down
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::models::Exercise;

use super::filters::equipment_satisfied;

fn sorted_join(items: &[String]) -> String {
    let mut sorted: Vec<&str> = items.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join("+")
}

/// Canonical `domain=..|role=..|eq=..|pattern=..` key of an exercise
#[must_use]
pub fn cluster_key(exercise: &Exercise) -> String {
    format!(
        "domain={}|role={}|eq={}|pattern={}",
        sorted_join(&exercise.domain),
        sorted_join(&exercise.role),
        sorted_join(&exercise.equipment_required),
        sorted_join(&exercise.pattern),
    )
}

fn same_tokens(a: &[String], b: &[String]) -> bool {
    sorted_join(a) == sorted_join(b)
}

fn same_domain_and_equipment(candidate: &Exercise, current: &Exercise, available: &[String]) -> bool {
    same_tokens(&candidate.domain, &current.domain)
        && same_tokens(&candidate.equipment_required, &current.equipment_required)
        && same_tokens(&candidate.equipment_required_any, &current.equipment_required_any)
        && equipment_satisfied(candidate, available)
}

/// Substitute for an exercise whose cluster is cooling down
///
/// Prefers a non-main exercise of the same cluster, then an assistant or
/// secondary exercise with the same domain and equipment. Ties go to the
/// lowest id.
#[must_use]
pub fn cooldown_fallback<'c>(
    exercises: &'c [Exercise],
    current: &Exercise,
    available: &[String],
) -> Option<&'c Exercise> {
    let same_cluster: Vec<&Exercise> = exercises
        .iter()
        .filter(|e| e.id != current.id)
        .filter(|e| same_domain_and_equipment(e, current, available))
        .filter(|e| same_tokens(&e.pattern, &current.pattern))
        .filter(|e| !e.role.iter().any(|r| r == "main"))
        .collect();
    let candidates = if same_cluster.is_empty() {
        exercises
            .iter()
            .filter(|e| e.id != current.id)
            .filter(|e| same_domain_and_equipment(e, current, available))
            .filter(|e| e.role.iter().any(|r| r == "assistant" || r == "secondary"))
            .collect()
    } else {
        same_cluster
    };
    candidates.into_iter().min_by(|a, b| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(value: serde_json::Value) -> Exercise {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cluster_key_is_sorted_and_joined() {
        let ex = exercise(json!({
            "id": "max_hang_5s",
            "domain": ["finger_strength"],
            "role": ["main", "assistant"],
            "equipment_required": ["hangboard", "weight"],
            "pattern": "hang"
        }));
        assert_eq!(
            cluster_key(&ex),
            "domain=finger_strength|role=assistant+main|eq=hangboard+weight|pattern=hang"
        );
    }

    #[test]
    fn test_fallback_prefers_same_cluster_non_main() {
        let current = exercise(json!({"id": "a_main", "domain": ["pulling_strength"], "role": ["main"], "pattern": ["pull"], "equipment_required": ["pullup_bar"]}));
        let catalog = vec![
            current.clone(),
            exercise(json!({"id": "c_assist", "domain": ["pulling_strength"], "role": ["assistant"], "pattern": ["row"], "equipment_required": ["pullup_bar"]})),
            exercise(json!({"id": "b_secondary", "domain": ["pulling_strength"], "role": ["secondary"], "pattern": ["pull"], "equipment_required": ["pullup_bar"]})),
        ];
        let available = vec!["pullup_bar".to_owned()];
        let pick = cooldown_fallback(&catalog, &current, &available).unwrap();
        assert_eq!(pick.id, "b_secondary");
    }

    #[test]
    fn test_fallback_requires_available_equipment() {
        let current = exercise(json!({"id": "a", "domain": ["core"], "role": ["main"], "equipment_required": ["rings"]}));
        let catalog = vec![
            current.clone(),
            exercise(json!({"id": "b", "domain": ["core"], "role": ["assistant"], "equipment_required": ["rings"]})),
        ];
        assert!(cooldown_fallback(&catalog, &current, &[]).is_none());
    }
}
