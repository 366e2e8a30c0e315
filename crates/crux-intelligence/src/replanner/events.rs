// ABOUTME: Event stream application: move, done, skipped, availability change, quick-add, adaptive
// ABOUTME: Every applied event is traced; the plan is reconciled once after the stream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::errors::PlanningError;
use crux_core::models::{
    Adaptation, AvailabilityChange, ExplainEntry, FeedbackLogEntry, Gym, Location, PlanDay,
    PlannedSession, PlanningPrefs, ReplanEvent, SessionStatus, Slot, WeekAvailability, WeekPlan,
    Weekday,
};
use tracing::{debug, info, warn};

use super::quick_add::{add_session, DayAdd};
use super::reconcile::{carry_completed, reconcile};
use super::{day_index, replacement};
use crate::adaptive::{apply_adaptive_replan, check_adaptive_replan};
use crate::macrocycle::session_pool;
use crate::planner::{apply_availability_change, planned_session, plan_week, PlanRequest};
use crate::training_constants::sessions::{COMPLEMENTARY, REGENERATION};

const FILL_CONSTRAINT: &str = "replanner_fill";
const SKIP_CONSTRAINT: &str = "skipped_recovery";

/// Inputs the event stream needs besides the plan
#[derive(Debug, Clone)]
pub struct ReplanContext<'a> {
    /// Normalized availability, updated in place by availability events
    pub availability: WeekAvailability,
    /// Planning preferences used when the week is regenerated
    pub planning_prefs: &'a PlanningPrefs,
    /// Known gyms
    pub gyms: &'a [Gym],
    /// Recent difficulty log for adaptive events, newest first
    pub feedback_log: &'a [FeedbackLogEntry],
}

impl<'a> ReplanContext<'a> {
    /// Context without feedback history
    #[must_use]
    pub const fn new(
        availability: WeekAvailability,
        planning_prefs: &'a PlanningPrefs,
        gyms: &'a [Gym],
    ) -> Self {
        Self {
            availability,
            planning_prefs,
            gyms,
            feedback_log: &[],
        }
    }

    /// Attach the feedback log used by adaptive events
    #[must_use]
    pub const fn with_feedback_log(mut self, feedback_log: &'a [FeedbackLogEntry]) -> Self {
        self.feedback_log = feedback_log;
        self
    }
}

fn matches(session: &PlannedSession, session_ref: Option<&str>, slot: Option<Slot>) -> bool {
    session_ref.is_none_or(|id| session.session_id == id) && slot.is_none_or(|s| session.slot == s)
}

fn find_session(
    day: &PlanDay,
    session_ref: Option<&str>,
    slot: Option<Slot>,
) -> Result<usize, PlanningError> {
    day.sessions
        .iter()
        .position(|s| matches(s, session_ref, slot))
        .ok_or_else(|| {
            PlanningError::session_not_in_day(
                day.date,
                session_ref.unwrap_or("*"),
                slot.map(|s| s.as_str().to_owned()),
            )
        })
}

/// Conservative session refilling a vacated slot
fn fill_session(plan: &WeekPlan, day: &PlanDay, slot: Slot, session_id: &str) -> PlannedSession {
    let at_gym = day.sessions.iter().any(|s| s.location == Location::Gym);
    let (location, gym_id) = if at_gym {
        (Location::Gym, plan.default_gym_id().map(str::to_owned))
    } else {
        (Location::Home, None)
    };
    let mut session = planned_session(session_id, slot, location, gym_id, plan.phase_id());
    session.constraints_applied.push(FILL_CONSTRAINT.to_owned());
    session.explain = vec![
        ExplainEntry::reason("deterministic refill"),
        ExplainEntry::reason(format!("fill_kind={session_id}")),
    ];
    session
}

fn move_session(
    plan: &mut WeekPlan,
    from_date: NaiveDate,
    from_slot: Option<Slot>,
    to_date: NaiveDate,
    to_slot: Slot,
    session_ref: Option<&str>,
) -> Result<(), PlanningError> {
    let from = day_index(plan, from_date)?;
    let to = day_index(plan, to_date)?;

    let origin = &mut plan.days_mut()[from];
    let position = find_session(origin, session_ref, from_slot)?;
    let mut moved = origin.sessions.remove(position);
    let vacated = from_slot.unwrap_or(moved.slot);
    moved.slot = to_slot;

    let target = &mut plan.days_mut()[to];
    target.sessions.retain(|s| s.slot != to_slot);
    target.sessions.push(moved);
    target.sort_sessions();

    let origin = &plan.days()[from];
    if origin.sessions.iter().any(|s| s.slot == vacated) {
        return Ok(());
    }
    let kind = if origin.has_hard() {
        COMPLEMENTARY
    } else {
        REGENERATION
    };
    let fill = fill_session(plan, origin, vacated, kind);
    let origin = &mut plan.days_mut()[from];
    origin.sessions.push(fill);
    origin.sort_sessions();
    debug!(%from_date, slot = vacated.as_str(), kind, "vacated slot refilled");
    Ok(())
}

fn mark_done(
    plan: &mut WeekPlan,
    date: NaiveDate,
    session_ref: Option<&str>,
    slot: Option<Slot>,
) -> Result<(), PlanningError> {
    let index = day_index(plan, date)?;
    let day = &mut plan.days_mut()[index];
    let position = find_session(day, session_ref, slot)?;
    day.sessions[position].status = Some(SessionStatus::Done);
    if day
        .sessions
        .iter()
        .all(|s| s.status == Some(SessionStatus::Done))
    {
        day.status = Some(SessionStatus::Done);
    }
    Ok(())
}

fn mark_skipped(
    plan: &mut WeekPlan,
    date: NaiveDate,
    session_ref: Option<&str>,
    slot: Option<Slot>,
) -> Result<(), PlanningError> {
    let index = day_index(plan, date)?;
    let phase = plan.phase_id();
    let day = &mut plan.days_mut()[index];
    let position = find_session(day, session_ref, slot)?;
    let removed = day.sessions.remove(position);
    let mut recovery = replacement(
        REGENERATION,
        &removed,
        phase,
        SKIP_CONSTRAINT,
        &[
            "session skipped".to_owned(),
            format!("skipped={}", removed.session_id),
        ],
    );
    recovery.status = Some(SessionStatus::Skipped);
    day.sessions.push(recovery);
    day.sort_sessions();
    day.status = Some(SessionStatus::Skipped);
    Ok(())
}

fn set_availability(
    plan: &mut WeekPlan,
    date: Option<NaiveDate>,
    change: &AvailabilityChange,
    context: &mut ReplanContext<'_>,
) -> Result<(), PlanningError> {
    let weekday = date
        .map(Weekday::from_date)
        .or(change.weekday)
        .ok_or_else(|| {
            PlanningError::invalid_input("availability.weekday", "a date or weekday is required")
        })?;
    apply_availability_change(&mut context.availability, weekday, change);

    let snapshot = &plan.profile_snapshot;
    let pool = session_pool(snapshot.phase_id);
    let request = PlanRequest {
        phase_id: snapshot.phase_id,
        domain_weights: &snapshot.domain_weights,
        session_pool: &pool,
        start_date: plan.start_date,
        availability: &context.availability,
        allowed_locations: &snapshot.allowed_locations,
        hard_cap_per_week: snapshot.hard_cap_per_week,
        planning_prefs: context.planning_prefs,
        default_gym_id: context
            .planning_prefs
            .default_gym_id
            .as_deref()
            .filter(|g| !g.is_empty()),
        gyms: context.gyms,
        intensity_cap: Some(snapshot.intensity_cap),
        pretrip_dates: &[],
        is_last_week_of_phase: false,
    };
    let regenerated = plan_week(&request);

    let previous = plan.clone();
    plan.weeks = regenerated.weeks;
    plan.profile_snapshot = regenerated.profile_snapshot;
    carry_completed(&previous, plan);
    info!(weekday = weekday.as_str(), slot = change.slot.as_str(), "week regenerated after availability change");
    Ok(())
}

fn apply_event(
    plan: &mut WeekPlan,
    event: &ReplanEvent,
    context: &mut ReplanContext<'_>,
) -> Result<(), PlanningError> {
    match event {
        ReplanEvent::MoveSession {
            from_date,
            from_slot,
            to_date,
            to_slot,
            session_ref,
        } => move_session(
            plan,
            *from_date,
            *from_slot,
            *to_date,
            *to_slot,
            session_ref.as_deref(),
        ),
        ReplanEvent::MarkDone {
            date,
            session_ref,
            slot,
        } => mark_done(plan, *date, session_ref.as_deref(), *slot),
        ReplanEvent::MarkSkipped {
            date,
            session_ref,
            slot,
        } => mark_skipped(plan, *date, session_ref.as_deref(), *slot),
        ReplanEvent::SetAvailability { date, availability } => {
            set_availability(plan, *date, availability, context)
        }
        ReplanEvent::QuickAdd {
            date,
            session_id,
            slot,
            location,
            gym_id,
            phase_id,
        } => {
            let request = DayAdd {
                date: *date,
                session_id: session_id.clone(),
                slot: *slot,
                location: *location,
                gym_id: gym_id.clone(),
                phase_id: *phase_id,
            };
            for warning in add_session(plan, &request)? {
                warn!(%date, %warning, "quick-add warning");
            }
            Ok(())
        }
        ReplanEvent::AdaptiveReplan { date } => {
            let actions = check_adaptive_replan(plan, context.feedback_log, *date);
            if !actions.is_empty() {
                *plan = apply_adaptive_replan(plan, &actions);
            }
            Ok(())
        }
    }
}

/// Apply `events` in order to a copy of `plan`
///
/// Each applied event is appended to the adaptation trace. The result is
/// reconciled once and its revision bumped.
///
/// # Errors
///
/// Returns `PlanningError::DateNotInPlan` for dates outside the week,
/// `PlanningError::SessionNotInDay` when no session matches a reference,
/// `PlanningError::SlotOccupied` when a quick-add targets a taken slot, and
/// `PlanningError::InvalidInput` for an availability change without a day.
pub fn apply_events(
    plan: &WeekPlan,
    events: &[ReplanEvent],
    context: &mut ReplanContext<'_>,
) -> Result<WeekPlan, PlanningError> {
    let mut updated = plan.clone();
    for event in events {
        apply_event(&mut updated, event, context)?;
        updated.adaptations.push(Adaptation::Event {
            event: event.clone(),
        });
    }
    reconcile(&mut updated);
    info!(
        events = events.len(),
        revision = updated.plan_revision,
        "replan events applied"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::normalize_availability;
    use crate::replanner::test_support::{date, day, plan, week};
    use crux_core::models::{AvailabilityInput, FeedbackLabel};

    fn context(prefs: &PlanningPrefs) -> ReplanContext<'_> {
        ReplanContext::new(
            normalize_availability(&AvailabilityInput::new(), &[Location::Gym, Location::Home]),
            prefs,
            &[],
        )
    }

    #[test]
    fn test_move_session_refills_origin_and_keeps_invariants() {
        let monday = day(
            date(5),
            &[("strength_long", Slot::Morning), ("prehab_maintenance", Slot::Evening)],
        );
        let tuesday = day(date(6), &[("technique_focus_gym", Slot::Evening)]);
        let base = plan(
            vec![
                monday,
                tuesday,
                day(date(7), &[]),
                day(date(8), &[("power_contact_gym", Slot::Evening)]),
            ],
            2,
        );
        let prefs = PlanningPrefs::default();
        let event = ReplanEvent::MoveSession {
            from_date: date(5),
            from_slot: Some(Slot::Morning),
            to_date: date(6),
            to_slot: Slot::Evening,
            session_ref: Some("strength_long".to_owned()),
        };

        let updated = apply_events(&base, &[event], &mut context(&prefs)).unwrap();

        let tuesday = updated.day(date(6)).unwrap();
        assert_eq!(tuesday.sessions.len(), 1);
        assert_eq!(tuesday.sessions[0].session_id, "strength_long");
        assert_eq!(tuesday.sessions[0].slot, Slot::Evening);

        let monday = updated.day(date(5)).unwrap();
        let fill = monday.sessions.iter().find(|s| s.slot == Slot::Morning).unwrap();
        assert_eq!(fill.session_id, REGENERATION);
        assert!(fill.constraints_applied.contains(&FILL_CONSTRAINT.to_owned()));
        assert_eq!(fill.location, Location::Gym);

        assert!(updated.pending_hard_days() <= 2);
        let finger_dates: Vec<NaiveDate> = updated
            .days()
            .iter()
            .filter(|d| d.has_finger())
            .map(|d| d.date)
            .collect();
        assert!(finger_dates.windows(2).all(|w| (w[1] - w[0]).num_days() > 1));
        assert_eq!(updated.plan_revision, 2);
        assert!(matches!(updated.adaptations[0], Adaptation::Event { .. }));
    }

    #[test]
    fn test_mark_done_keeps_session_and_sets_day_status() {
        let base = week(["strength_long", "", "", "", "", "", ""], 3);
        let prefs = PlanningPrefs::default();
        let event = ReplanEvent::MarkDone {
            date: date(5),
            session_ref: None,
            slot: Some(Slot::Evening),
        };
        let updated = apply_events(&base, &[event], &mut context(&prefs)).unwrap();
        let monday = updated.day(date(5)).unwrap();
        assert_eq!(monday.sessions.len(), 1);
        assert_eq!(monday.sessions[0].session_id, "strength_long");
        assert_eq!(monday.sessions[0].status, Some(SessionStatus::Done));
        assert_eq!(monday.status, Some(SessionStatus::Done));
    }

    #[test]
    fn test_mark_skipped_leaves_skipped_recovery() {
        let base = week(["", "power_contact_gym", "", "", "", "", ""], 3);
        let prefs = PlanningPrefs::default();
        let event = ReplanEvent::MarkSkipped {
            date: date(6),
            session_ref: Some("power_contact_gym".to_owned()),
            slot: None,
        };
        let updated = apply_events(&base, &[event], &mut context(&prefs)).unwrap();
        let tuesday = updated.day(date(6)).unwrap();
        assert_eq!(tuesday.sessions.len(), 1);
        assert_eq!(tuesday.sessions[0].session_id, REGENERATION);
        assert_eq!(tuesday.sessions[0].slot, Slot::Evening);
        assert_eq!(tuesday.sessions[0].status, Some(SessionStatus::Skipped));
        assert_eq!(tuesday.status, Some(SessionStatus::Skipped));
    }

    #[test]
    fn test_unknown_session_and_date_are_errors() {
        let base = week(["strength_long", "", "", "", "", "", ""], 3);
        let prefs = PlanningPrefs::default();
        let missing = ReplanEvent::MarkDone {
            date: date(5),
            session_ref: Some("yoga_recovery".to_owned()),
            slot: None,
        };
        assert!(matches!(
            apply_events(&base, &[missing], &mut context(&prefs)),
            Err(PlanningError::SessionNotInDay { .. })
        ));
        let outside = ReplanEvent::MarkDone {
            date: date(20),
            session_ref: None,
            slot: None,
        };
        assert!(matches!(
            apply_events(&base, &[outside], &mut context(&prefs)),
            Err(PlanningError::DateNotInPlan { .. })
        ));
    }

    #[test]
    fn test_availability_change_regenerates_and_keeps_history() {
        let mut base = week(["strength_long", "", "", "", "", "", ""], 3);
        base.weeks[0].days[0].sessions[0].status = Some(SessionStatus::Done);
        let prefs = PlanningPrefs::default();
        let mut ctx = context(&prefs);
        let event = ReplanEvent::SetAvailability {
            date: Some(date(7)),
            availability: AvailabilityChange {
                weekday: None,
                slot: Slot::Evening,
                available: Some(false),
                locations: None,
                preferred_location: None,
                gym_id: None,
            },
        };
        let updated = apply_events(&base, &[event], &mut ctx).unwrap();

        let monday = updated.day(date(5)).unwrap();
        assert!(monday
            .sessions
            .iter()
            .any(|s| s.session_id == "strength_long" && s.status == Some(SessionStatus::Done)));
        let wednesday = updated.day(date(7)).unwrap();
        assert!(wednesday.sessions.iter().all(|s| s.slot != Slot::Evening));
        assert!(!ctx
            .availability
            .slot(Weekday::Wed, Slot::Evening)
            .is_some_and(|s| s.available));
    }

    #[test]
    fn test_quick_add_over_cap_survives_reconcile_with_warning() {
        let base = week(["strength_long", "", "", "", "", "", ""], 1);
        let prefs = PlanningPrefs::default();
        let mut ctx = context(&prefs);
        let event = ReplanEvent::QuickAdd {
            date: date(8),
            session_id: "power_contact_gym".to_owned(),
            slot: Slot::Evening,
            location: Location::Gym,
            gym_id: None,
            phase_id: None,
        };
        let updated = apply_events(&base, &[event], &mut ctx).unwrap();

        let thursday = updated.day(date(8)).unwrap();
        let ids: Vec<&str> = thursday.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, ["power_contact_gym"]);
        assert_eq!(
            updated.day(date(5)).unwrap().sessions[0].session_id,
            "strength_long"
        );
        assert!(updated.adaptations.iter().any(|a| matches!(
            a,
            Adaptation::HardCapWarning { target_date, message }
                if *target_date == date(8) && message.contains("exceeds weekly cap (1)")
        )));
    }

    #[test]
    fn test_adaptive_event_uses_feedback_log() {
        let base = week(["", "", "", "power_contact_gym", "", "", ""], 3);
        let prefs = PlanningPrefs::default();
        let log = [FeedbackLogEntry {
            date: date(6),
            session_id: "strength_long".to_owned(),
            difficulty: FeedbackLabel::VeryHard,
        }];
        let mut ctx = context(&prefs).with_feedback_log(&log);
        let event = ReplanEvent::AdaptiveReplan { date: date(6) };
        let updated = apply_events(&base, &[event], &mut ctx).unwrap();
        let thursday = updated.day(date(8)).unwrap();
        assert_eq!(thursday.sessions[0].session_id, COMPLEMENTARY);
        assert!(updated
            .adaptations
            .iter()
            .any(|a| matches!(a, Adaptation::AdaptiveReplan { .. })));
    }
}
