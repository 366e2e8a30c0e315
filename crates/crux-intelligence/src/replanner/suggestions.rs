// ABOUTME: Deterministic quick-add suggestions scored against the current week
// ABOUTME: Rewards variety and recovery after hard days, rules out cap and finger-spacing breaks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::collections::BTreeSet;

use chrono::NaiveDate;
use crux_core::dates::add_days;
use crux_core::models::{Intensity, Location, WeekPlan};
use serde::{Deserialize, Serialize};

use crate::macrocycle::session_pool;
use crate::training_constants::sessions;

const VARIETY_BONUS: i32 = 10;
const AFTER_HARD_BONUS: i32 = 5;
const BLOCKED: i32 = -1000;

/// A candidate session for quick-add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSuggestion {
    /// Catalog session id
    pub session_id: String,
    /// Intensity
    pub intensity: Intensity,
    /// Load score of the intensity
    pub estimated_load_score: u32,
    /// Why it is suggested
    pub reason: String,
}

/// Up to `limit` sessions to add on `date` at `location`, best first
///
/// Candidates come from `pool` or the plan phase's pool. Ties break on the
/// session id, so identical inputs give identical suggestions.
#[must_use]
pub fn suggest_sessions(
    plan: &WeekPlan,
    date: NaiveDate,
    location: Location,
    pool: Option<&[String]>,
    limit: usize,
) -> Vec<SessionSuggestion> {
    let phase_pool;
    let pool = if let Some(pool) = pool {
        pool
    } else {
        phase_pool = session_pool(plan.phase_id());
        &phase_pool
    };

    let scheduled: BTreeSet<&str> = plan
        .days()
        .iter()
        .flat_map(|d| &d.sessions)
        .filter(|s| s.is_pending())
        .map(|s| s.session_id.as_str())
        .collect();
    let cap_reached = plan.pending_hard_days() >= plan.profile_snapshot.hard_cap_per_week;
    let finger_adjacent = plan
        .days()
        .iter()
        .filter(|d| d.date != date && (d.date - date).num_days().abs() <= 1)
        .any(|d| d.has_finger());
    let previous = add_days(date, -1);
    let follows_hard = plan.day(previous).is_some_and(|d| d.has_hard());

    let mut scored: Vec<(i32, &str, sessions::SessionMeta, String)> = pool
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .filter_map(|id| {
            let meta = sessions::lookup_or_default(id);
            meta.allows(location).then_some((id, meta))
        })
        .map(|(id, meta)| {
            let fresh = !scheduled.contains(id);
            let gentle = matches!(meta.intensity, Intensity::Low | Intensity::Medium);
            let mut score = 0;
            let mut reasons = Vec::new();
            if fresh {
                score += VARIETY_BONUS;
                reasons.push("adds variety");
            }
            if follows_hard && !meta.hard {
                if gentle {
                    score += AFTER_HARD_BONUS;
                }
                reasons.push("good after a hard day");
            }
            if meta.hard {
                if cap_reached {
                    score += BLOCKED;
                }
                reasons.push("high intensity");
            }
            if meta.finger && finger_adjacent {
                score += BLOCKED;
            }
            let reason = if reasons.is_empty() {
                "available".to_owned()
            } else {
                reasons.join("; ")
            };
            (score, id, meta, reason)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, id, meta, reason)| SessionSuggestion {
            session_id: id.to_owned(),
            intensity: meta.intensity,
            estimated_load_score: meta.intensity.load_score(),
            reason,
        })
        .collect()
}
