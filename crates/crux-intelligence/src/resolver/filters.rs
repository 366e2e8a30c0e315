// ABOUTME: Staged candidate filtering and deterministic scoring for block exercise selection
// ABOUTME: Each stage records the surviving candidate count in the block's filter trace
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::models::{Exercise, FilterSet, FilterTrace, Location};
use std::cmp::Reverse;

use crate::config::ResolverConfig;

fn record(trace: &mut FilterTrace, stage: &str, count: usize) {
    trace.counts.insert(stage.to_owned(), count);
}

fn any_shared(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

/// Whether the exercise's equipment needs are met
#[must_use]
pub fn equipment_satisfied(exercise: &Exercise, available: &[String]) -> bool {
    exercise
        .equipment_required
        .iter()
        .all(|e| available.contains(e))
        && (exercise.equipment_required_any.is_empty()
            || any_shared(&exercise.equipment_required_any, available))
}

/// Hard filters: location, equipment, role, domain, pattern, then selection attributes
///
/// Empty filter lists do not constrain. Counts land in `trace.counts`.
#[must_use]
pub fn hard_filter<'c>(
    exercises: &'c [Exercise],
    location: Location,
    available: &[String],
    filters: &FilterSet,
    trace: &mut FilterTrace,
) -> Vec<&'c Exercise> {
    let mut pool: Vec<&Exercise> = exercises.iter().collect();
    record(trace, "start", pool.len());

    pool.retain(|e| e.location_allowed.contains(&location));
    record(trace, "after_location", pool.len());

    pool.retain(|e| equipment_satisfied(e, available));
    record(trace, "after_equipment", pool.len());

    let roles = filters.role.as_deref().unwrap_or_default();
    if !roles.is_empty() {
        pool.retain(|e| e.has_any_role(roles));
    }
    record(trace, "after_role", pool.len());

    trace.domain_filter_applied = Some(!filters.domain.is_empty());
    if !filters.domain.is_empty() {
        pool.retain(|e| e.has_any_domain(&filters.domain));
    }
    record(trace, "after_domain", pool.len());

    if !filters.pattern.is_empty() {
        pool.retain(|e| any_shared(&e.pattern, &filters.pattern));
    }
    record(trace, "after_pattern", pool.len());

    if !filters.intensity_level.is_empty() {
        pool.retain(|e| {
            e.intensity_level
                .as_deref()
                .is_some_and(|level| filters.intensity_level.iter().any(|l| l == level))
        });
    }
    if !filters.equipment_any.is_empty() {
        pool.retain(|e| {
            any_shared(&e.equipment_required, &filters.equipment_any)
                || any_shared(&e.equipment_required_any, &filters.equipment_any)
        });
    }
    if !filters.equipment_all.is_empty() {
        pool.retain(|e| {
            filters
                .equipment_all
                .iter()
                .all(|t| e.equipment_required.contains(t) || e.equipment_required_any.contains(t))
        });
    }
    record(trace, "after_attributes", pool.len());
    pool
}

/// Preference bonus minus recency penalty
///
/// `recent` is ordered most recent first.
#[must_use]
pub fn score(exercise: &Exercise, recent: &[String], config: &ResolverConfig) -> i64 {
    let mut total = 0_i64;
    if let Some(position) = recent.iter().position(|id| id.eq_ignore_ascii_case(&exercise.id)) {
        total -= if position < config.recent_window {
            config.recent_penalty
        } else if position < config.mid_window {
            config.mid_penalty
        } else {
            config.old_penalty
        };
    }
    if let Some(attributes) = &exercise.attributes {
        if attributes.edge_mm == Some(config.preferred_edge_mm) {
            total += config.edge_bonus;
        }
        if attributes
            .grip
            .as_deref()
            .is_some_and(|g| g.trim().eq_ignore_ascii_case(&config.preferred_grip))
        {
            total += config.grip_bonus;
        }
    }
    total
}

/// Highest score first, ties by ascending id
#[must_use]
pub fn best<'c>(
    candidates: &[&'c Exercise],
    recent: &[String],
    config: &ResolverConfig,
) -> Option<&'c Exercise> {
    candidates
        .iter()
        .copied()
        .map(|e| (Reverse(score(e, recent, config)), e))
        .min_by(|(sa, a), (sb, b)| sa.cmp(sb).then_with(|| a.id.cmp(&b.id)))
        .map(|(_, e)| e)
}
