// ABOUTME: Reconciliation pass restoring finger spacing and the weekly hard cap after a mutation
// ABOUTME: Merge of completed sessions from an old plan into a regenerated one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::models::{PhaseId, PlanDay, PlannedSession, SessionStatus, WeekPlan};
use tracing::debug;

use super::quick_add::is_quick_added;
use super::replacement;
use crate::planner::load_summary;
use crate::training_constants::sessions::REGENERATION;

const FINGER_SPACING: &str = "finger_spacing_downshift";
const HARD_CAP: &str = "hard_cap_downshift";

fn downshift(
    day: &mut PlanDay,
    phase: PhaseId,
    constraint: &str,
    reason: &str,
    matches: impl Fn(&PlannedSession) -> bool,
) {
    for session in day.sessions.iter_mut() {
        if !session.is_pending() || !matches(session) {
            continue;
        }
        *session = replacement(
            REGENERATION,
            session,
            phase,
            constraint,
            &[reason.to_owned(), format!("replaced={}", session.session_id)],
        );
    }
    day.sort_sessions();
}

fn enforce_finger_spacing(plan: &mut WeekPlan) {
    let phase = plan.phase_id();
    let mut last_finger: Option<NaiveDate> = None;
    for day in plan.days_mut() {
        if !day.has_finger() {
            continue;
        }
        if last_finger.is_some_and(|prev| (day.date - prev).num_days() <= 1) {
            debug!(date = %day.date, "finger spacing downshift");
            downshift(
                day,
                phase,
                FINGER_SPACING,
                "finger sessions need a rest day between them",
                |s| s.tags.finger,
            );
            if !day.has_finger() {
                continue;
            }
        }
        last_finger = Some(day.date);
    }
}

/// Hard session counted against the cap; quick-adds only warn
fn cappable(session: &PlannedSession) -> bool {
    session.tags.hard && session.status != Some(SessionStatus::Done) && !is_quick_added(session)
}

fn enforce_hard_cap(plan: &mut WeekPlan) {
    let phase = plan.phase_id();
    let cap = plan.profile_snapshot.hard_cap_per_week as usize;
    let hard_days: Vec<usize> = plan
        .days()
        .iter()
        .enumerate()
        .filter(|(_, d)| d.sessions.iter().any(cappable))
        .map(|(i, _)| i)
        .collect();
    let Some(excess) = hard_days.get(cap..) else {
        return;
    };
    for &index in excess.iter().rev() {
        let day = &mut plan.days_mut()[index];
        debug!(date = %day.date, cap, "hard cap downshift");
        downshift(
            day,
            phase,
            HARD_CAP,
            "weekly hard-day cap exceeded",
            cappable,
        );
    }
}

/// Restore the week invariants after a mutation and bump the revision
///
/// Finger days within one day of the previous finger day and hard days past
/// the weekly cap (latest first) are downshifted to `regeneration_easy`.
/// Quick-added sessions never count against the cap and are never
/// downshifted by it. The revision is bumped on every call.
pub fn reconcile(plan: &mut WeekPlan) {
    enforce_finger_spacing(plan);
    enforce_hard_cap(plan);
    plan.weekly_load_summary = load_summary(plan.days());
    plan.plan_revision += 1;
}

/// Copy done and skipped sessions of `old` over the same days of `plan`
pub(super) fn carry_completed(old: &WeekPlan, plan: &mut WeekPlan) {
    for old_day in old.days() {
        let kept: Vec<&PlannedSession> = old_day
            .sessions
            .iter()
            .filter(|s| s.is_completed())
            .collect();
        if kept.is_empty() {
            continue;
        }
        let Some(day) = plan.day_mut(old_day.date) else {
            continue;
        };
        for session in kept {
            match day.sessions.iter_mut().find(|s| s.slot == session.slot) {
                Some(existing) => *existing = session.clone(),
                None => day.sessions.push(session.clone()),
            }
        }
        if old_day.status.is_some() {
            day.status = old_day.status;
        }
        day.sort_sessions();
    }
    plan.weekly_load_summary = load_summary(plan.days());
}

/// Carry done and skipped sessions of `old` into the regenerated `new`
///
/// A kept session replaces the generated session in its slot or is
/// appended when the slot is free. The result's revision is `new + 1`.
#[must_use]
pub fn regenerate_preserving_completed(old: &WeekPlan, new: &WeekPlan) -> WeekPlan {
    let mut merged = new.clone();
    carry_completed(old, &mut merged);
    merged.plan_revision = new.plan_revision + 1;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replanner::test_support::{date, day, plan};
    use crux_core::models::Slot;

    #[test]
    fn test_reconcile_spaces_finger_days_and_caps_hard_days() {
        let mut week = plan(
            vec![
                day(date(5), &[("strength_long", Slot::Evening)]),
                day(date(6), &[("strength_long", Slot::Evening)]),
                day(date(8), &[("power_contact_gym", Slot::Evening)]),
                day(date(10), &[("power_contact_gym", Slot::Evening)]),
            ],
            2,
        );
        reconcile(&mut week);

        let tuesday = week.day(date(6)).unwrap();
        assert_eq!(tuesday.sessions[0].session_id, REGENERATION);
        assert!(tuesday.sessions[0]
            .constraints_applied
            .contains(&FINGER_SPACING.to_owned()));

        let saturday = week.day(date(10)).unwrap();
        assert_eq!(saturday.sessions[0].session_id, REGENERATION);
        assert!(saturday.sessions[0]
            .constraints_applied
            .contains(&HARD_CAP.to_owned()));
        assert_eq!(week.pending_hard_days(), 2);
        assert_eq!(week.plan_revision, 2);
    }

    #[test]
    fn test_reconcile_keeps_done_sessions() {
        let mut first = day(date(5), &[("strength_long", Slot::Evening)]);
        let mut second = day(date(6), &[("strength_long", Slot::Evening)]);
        first.sessions[0].status = Some(SessionStatus::Done);
        second.sessions[0].status = Some(SessionStatus::Done);
        let mut week = plan(vec![first, second], 0);
        reconcile(&mut week);
        assert!(week
            .days()
            .iter()
            .all(|d| d.sessions[0].session_id == "strength_long"));
    }

    #[test]
    fn test_preserving_completed_replaces_slot_and_bumps_revision() {
        let mut old = plan(vec![day(date(5), &[("strength_long", Slot::Evening)])], 3);
        old.weeks[0].days[0].sessions[0].status = Some(SessionStatus::Skipped);
        let mut new = plan(
            vec![day(
                date(5),
                &[("technique_focus_gym", Slot::Evening), ("prehab_maintenance", Slot::Lunch)],
            )],
            3,
        );
        new.plan_revision = 4;

        let merged = regenerate_preserving_completed(&old, &new);
        let monday = merged.day(date(5)).unwrap();
        assert_eq!(monday.sessions.len(), 2);
        assert_eq!(monday.sessions[1].session_id, "strength_long");
        assert_eq!(monday.sessions[1].status, Some(SessionStatus::Skipped));
        assert_eq!(merged.plan_revision, 5);
    }
}
