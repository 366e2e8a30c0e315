// ABOUTME: Day override by training intent with a two-day recovery ripple
// ABOUTME: Relocates a lost finger stimulus and warns when the override phase differs from the plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::NaiveDate;
use crux_core::dates::add_days;
use crux_core::errors::PlanningError;
use crux_core::models::{Adaptation, ExplainEntry, Location, PhaseId, Slot, WeekPlan};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::reconcile::reconcile;
use super::{day_index, ripple_day, Ripple};
use crate::planner::planned_session;
use crate::training_constants::intents;
use crate::training_constants::sessions::{FINGER_COMPENSATION_REPLACEABLE, FINGER_MAINTENANCE};

const MANUAL_OVERRIDE: &str = "manual_override";
const RIPPLE_PROPORTIONAL: &str = "recovery_ripple_proportional";
const RIPPLE_RECOVERY: &str = "recovery_ripple";
const FINGER_COMPENSATION: &str = "finger_compensation";
const COMPENSATION_WARNING: &str = "Could not find a suitable day to compensate lost finger session";

const fn evening() -> Slot {
    Slot::Evening
}

/// A user request to train something else on a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverride {
    /// Training intent (`strength`, `rest`, `finger_max`, ...)
    pub intent: String,
    /// Where the session runs
    pub location: Location,
    /// Day the user acts from
    pub reference_date: NaiveDate,
    /// Slot of the new session
    #[serde(default = "evening")]
    pub slot: Slot,
    /// Phase of the new session, defaulting to the plan phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<PhaseId>,
    /// Day to override, defaulting to the day after `reference_date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// Gym, defaulting to the plan's default gym for gym sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
}

impl DayOverride {
    /// Day the override replaces
    #[must_use]
    pub fn resolved_target(&self) -> NaiveDate {
        self.target_date
            .unwrap_or_else(|| add_days(self.reference_date, 1))
    }
}

/// Move a lost finger stimulus to a later day
///
/// The receiving day lies at least two days after `lost`, more than one day
/// from every finger day, and holds a pending non-hard session that may be
/// replaced.
fn compensate_finger(plan: &mut WeekPlan, lost: NaiveDate, phase: PhaseId) {
    let finger_dates: Vec<NaiveDate> = plan
        .days()
        .iter()
        .filter(|d| d.has_finger())
        .map(|d| d.date)
        .collect();
    let spaced = |date: NaiveDate| {
        finger_dates
            .iter()
            .all(|f| (date - *f).num_days().abs() > 1)
    };

    let candidate = plan.days().iter().enumerate().find_map(|(index, day)| {
        if (day.date - lost).num_days() < 2 || !spaced(day.date) || day.has_finger() {
            return None;
        }
        day.sessions
            .iter()
            .position(|s| {
                s.is_pending()
                    && !s.tags.hard
                    && FINGER_COMPENSATION_REPLACEABLE.contains(&s.session_id.as_str())
            })
            .map(|position| (index, position))
    });

    let Some((index, position)) = candidate else {
        debug!(%lost, "no day can take the lost finger session");
        plan.adaptations.push(Adaptation::FingerCompensationWarning {
            lost_date: lost,
            message: COMPENSATION_WARNING.to_owned(),
        });
        return;
    };

    let day = &mut plan.days_mut()[index];
    let slot = day.sessions[position].slot;
    let mut session = planned_session(FINGER_MAINTENANCE, slot, Location::Home, None, phase);
    session.constraints_applied.push(FINGER_COMPENSATION.to_owned());
    session.explain = vec![
        ExplainEntry::reason("finger compensation after override"),
        ExplainEntry::reason(format!("lost_date={lost}")),
    ];
    day.sessions[position] = session;
    day.sort_sessions();
    let compensated_date = day.date;
    debug!(%lost, %compensated_date, "finger session relocated");
    plan.adaptations.push(Adaptation::FingerCompensation {
        compensated_date,
        lost_date: lost,
    });
}

/// Replace a day with one session chosen by intent
///
/// Hard or finger overrides ripple: on the next day hard sessions become
/// `complementary_conditioning` and other non-low sessions
/// `regeneration_easy`; on the day after, every non-low session becomes
/// `regeneration_easy`. The plan is then reconciled.
///
/// # Errors
///
/// Returns `PlanningError::UnsupportedIntent` for an unknown intent and
/// `PlanningError::DateNotInPlan` when the target day is outside the week.
pub fn apply_day_override(
    plan: &WeekPlan,
    request: &DayOverride,
) -> Result<WeekPlan, PlanningError> {
    let session_id = intents::session_for(&request.intent)
        .ok_or_else(|| PlanningError::unsupported_intent(&request.intent))?;
    let target = request.resolved_target();
    let mut updated = plan.clone();
    let index = day_index(&updated, target)?;

    let current_phase = updated.phase_id();
    let phase = request.phase_id.unwrap_or(current_phase);
    let gym_id = match (&request.gym_id, request.location) {
        (Some(gym), _) => Some(gym.clone()),
        (None, Location::Gym) => updated.default_gym_id().map(str::to_owned),
        (None, _) => None,
    };

    let mut session = planned_session(session_id, request.slot, request.location, gym_id, phase);
    session.constraints_applied.push(MANUAL_OVERRIDE.to_owned());
    session.explain = vec![
        ExplainEntry::reason("user day override applied"),
        ExplainEntry::reason(format!("override_intent={}", request.intent.trim())),
    ];
    let tags = session.tags;

    let day = &mut updated.days_mut()[index];
    let lost_finger = day.has_finger() && !tags.finger;
    day.sessions = vec![session];

    if tags.hard || tags.finger {
        for (offset, mode, constraint) in [
            (1, Ripple::Proportional, RIPPLE_PROPORTIONAL),
            (2, Ripple::Recovery, RIPPLE_RECOVERY),
        ] {
            if let Some(next) = updated.day_mut(add_days(target, offset)) {
                ripple_day(next, mode, phase, constraint, target);
            }
        }
    }

    if lost_finger {
        compensate_finger(&mut updated, target, phase);
    }

    reconcile(&mut updated);
    updated.adaptations.push(Adaptation::DayOverride {
        reference_date: request.reference_date,
        target_date: target,
        ripple_days: vec![add_days(target, 1), add_days(target, 2)],
    });
    if phase != current_phase {
        updated.adaptations.push(Adaptation::PhaseMismatchWarning {
            requested_phase: phase,
            current_phase,
            message: format!(
                "Override session uses phase '{}' but current plan phase is '{}'",
                phase.as_str(),
                current_phase.as_str()
            ),
        });
    }
    info!(%target, session_id, intent = %request.intent, "day override applied");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replanner::test_support::{date, week};
    use crate::training_constants::sessions::{COMPLEMENTARY, REGENERATION};

    fn request(intent: &str, reference: u32) -> DayOverride {
        DayOverride {
            intent: intent.to_owned(),
            location: Location::Gym,
            reference_date: date(reference),
            slot: Slot::Evening,
            phase_id: None,
            target_date: None,
            gym_id: None,
        }
    }

    #[test]
    fn test_hard_override_ripples_two_days() {
        let base = week(
            [
                "technique_focus_gym",
                "",
                "power_endurance_gym",
                "complementary_conditioning",
                "prehab_maintenance",
                "",
                "",
            ],
            3,
        );
        let updated = apply_day_override(&base, &request("power", 4)).unwrap();

        let monday = updated.day(date(5)).unwrap();
        assert_eq!(monday.sessions.len(), 1);
        assert_eq!(monday.sessions[0].session_id, "power_contact_gym");
        assert!(monday.sessions[0]
            .constraints_applied
            .contains(&MANUAL_OVERRIDE.to_owned()));

        for offset in [1, 2] {
            let day = updated.day(date(5 + offset)).unwrap();
            assert!(!day.has_hard(), "day +{offset} still hard");
        }
        let wednesday = updated.day(date(7)).unwrap();
        assert_eq!(wednesday.sessions[0].session_id, REGENERATION);
        assert_eq!(updated.day(date(8)).unwrap().sessions[0].session_id, COMPLEMENTARY);
        assert!(matches!(
            updated.adaptations.last(),
            Some(Adaptation::DayOverride { .. })
        ));
    }

    #[test]
    fn test_proportional_ripple_on_next_day() {
        let base = week(
            ["", "power_endurance_gym", "technique_focus_gym", "", "", "", ""],
            3,
        );
        let mut override_request = request("strength", 3);
        override_request.target_date = Some(date(5));
        let updated = apply_day_override(&base, &override_request).unwrap();
        assert_eq!(updated.day(date(6)).unwrap().sessions[0].session_id, COMPLEMENTARY);
        assert_eq!(updated.day(date(7)).unwrap().sessions[0].session_id, REGENERATION);
    }

    #[test]
    fn test_lost_finger_session_is_compensated() {
        let base = week(
            ["", "strength_long", "", "", "complementary_conditioning", "", ""],
            3,
        );
        let updated = apply_day_override(&base, &request("rest", 5)).unwrap();

        let friday = updated.day(date(9)).unwrap();
        assert_eq!(friday.sessions[0].session_id, FINGER_MAINTENANCE);
        assert_eq!(friday.sessions[0].location, Location::Home);
        assert!(updated.adaptations.iter().any(|a| matches!(
            a,
            Adaptation::FingerCompensation { compensated_date, lost_date }
                if *compensated_date == date(9) && *lost_date == date(6)
        )));
    }

    #[test]
    fn test_compensation_warning_when_no_day_fits() {
        let base = week(["", "strength_long", "", "", "", "", ""], 3);
        let updated = apply_day_override(&base, &request("rest", 5)).unwrap();
        assert!(updated
            .adaptations
            .iter()
            .any(|a| matches!(a, Adaptation::FingerCompensationWarning { .. })));
    }

    #[test]
    fn test_unknown_intent_and_phase_mismatch() {
        let base = week(["", "", "", "", "", "", ""], 3);
        assert!(matches!(
            apply_day_override(&base, &request("nap", 5)),
            Err(PlanningError::UnsupportedIntent { .. })
        ));

        let mut mismatched = request("technique", 5);
        mismatched.phase_id = Some(PhaseId::Base);
        let updated = apply_day_override(&base, &mismatched).unwrap();
        assert!(matches!(
            updated.adaptations.last(),
            Some(Adaptation::PhaseMismatchWarning { .. })
        ));
        assert_eq!(updated.plan_revision, 2);
    }
}
