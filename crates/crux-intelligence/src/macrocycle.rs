// ABOUTME: Macrocycle generator composing canonical phases with durations, weights, and session pools
// ABOUTME: Week context lookup, pre-trip detection, phase extension and adaptive deload checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Macrocycle Generator
//!
//! A macrocycle is the five canonical phases laid end to end. Durations
//! start from the twelve-week allocation, take a single adjustment for the
//! weakest axis, then scale to the requested length on the base phase.
//! Domain weights are nudged towards weaknesses and renormalized.

use chrono::NaiveDate;
use crux_core::dates::{add_days, days_between, now_timestamp};
use crux_core::errors::PlanningError;
use crux_core::grades::Grade;
use crux_core::models::{
    AssessmentProfile, Axis, Domain, DomainWeights, FeedbackLabel, Goal, GoalSnapshot, Intensity,
    Macrocycle, Phase, PhaseId, PretripDeload, Trip, WeekPlan, WeekTargets,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::PlanningConfig;
use crate::training_constants::phases;

/// Scores below this count as a weakness
const WEAKNESS_THRESHOLD: u8 = 50;
/// Scores above this count as a strength
const STRENGTH_THRESHOLD: u8 = 75;
/// Weight added to a weak domain
const WEAKNESS_BOOST: f64 = 0.05;
/// Weight removed from a strong domain
const STRENGTH_CUT: f64 = 0.03;
/// Lowest weight a strong domain is cut to
const WEIGHT_FLOOR: f64 = 0.02;
/// Goal gap above which one macrocycle is unlikely to be enough
const MAX_GOAL_GAP: i64 = 8;

/// Axes considered for the duration adjustment, in tie-break order
const DURATION_AXES: [Axis; 5] = [
    Axis::PowerEndurance,
    Axis::Endurance,
    Axis::FingerStrength,
    Axis::PullingStrength,
    Axis::Technique,
];

/// Axis to domain mapping used for weight adjustments
const AXIS_DOMAINS: [(Axis, Domain); 6] = [
    (Axis::FingerStrength, Domain::FingerStrength),
    (Axis::PullingStrength, Domain::PullingStrength),
    (Axis::PowerEndurance, Domain::PowerEndurance),
    (Axis::Technique, Domain::Technique),
    (Axis::Endurance, Domain::VolumeClimbing),
    (Axis::BodyComposition, Domain::CorePrehab),
];

/// Phase to extend and phase to shrink for a weak axis
const fn weakness_adjustment(axis: Axis) -> Option<(PhaseId, PhaseId)> {
    match axis {
        Axis::PowerEndurance => Some((PhaseId::PowerEndurance, PhaseId::Base)),
        Axis::Endurance => Some((PhaseId::Base, PhaseId::StrengthPower)),
        Axis::FingerStrength | Axis::PullingStrength => {
            Some((PhaseId::StrengthPower, PhaseId::Base))
        }
        Axis::Technique => Some((PhaseId::Base, PhaseId::Performance)),
        Axis::BodyComposition => None,
    }
}

/// Inputs of [`generate_macrocycle`]
#[derive(Debug, Clone)]
pub struct MacrocycleRequest<'a> {
    /// Goal to plan towards
    pub goal: &'a Goal,
    /// Current six-axis profile
    pub profile: &'a AssessmentProfile,
    /// Planned trips
    pub trips: &'a [Trip],
    /// Monday of week 1
    pub start_date: NaiveDate,
    /// Total length in weeks
    pub total_weeks: u32,
}

/// Phase durations in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Durations([u32; 5]);

impl Durations {
    fn canonical() -> Self {
        Self(PhaseId::ALL.map(phases::base_duration))
    }

    const fn get(&self, phase: PhaseId) -> u32 {
        self.0[phase as usize]
    }

    fn get_mut(&mut self, phase: PhaseId) -> &mut u32 {
        &mut self.0[phase as usize]
    }

    fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

/// Weakest axis among the duration axes, first in order on ties
fn weakest_axis(profile: &AssessmentProfile) -> (Axis, u8) {
    DURATION_AXES
        .iter()
        .map(|axis| (*axis, profile.score(*axis)))
        .fold(None, |best: Option<(Axis, u8)>, candidate| match best {
            Some(b) if b.1 <= candidate.1 => Some(b),
            _ => Some(candidate),
        })
        .unwrap_or((Axis::PowerEndurance, WEAKNESS_THRESHOLD))
}

fn compute_durations(profile: &AssessmentProfile, total_weeks: u32) -> Durations {
    let mut durations = Durations::canonical();

    let (axis, score) = weakest_axis(profile);
    if score < WEAKNESS_THRESHOLD {
        if let Some((extend, shrink)) = weakness_adjustment(axis) {
            if durations.get(shrink) > phases::MIN_PHASE_WEEKS {
                *durations.get_mut(extend) += 1;
                *durations.get_mut(shrink) -= 1;
                debug!(?axis, score, %extend, %shrink, "phase durations adjusted for weakness");
            }
        }
    }

    // Scale to the requested length on the base phase
    let base = i64::from(durations.get(PhaseId::Base));
    let scaled = base + i64::from(total_weeks) - i64::from(durations.total());
    let floor = i64::from(phases::MIN_PHASE_WEEKS);
    *durations.get_mut(PhaseId::Base) = scaled.max(floor) as u32;

    let mut deficit = (floor - scaled).max(0);
    while deficit > 0 {
        let donor = [
            PhaseId::StrengthPower,
            PhaseId::PowerEndurance,
            PhaseId::Performance,
        ]
        .into_iter()
        .filter(|p| durations.get(*p) > phases::MIN_PHASE_WEEKS)
        .fold(None, |best: Option<PhaseId>, p| match best {
            Some(b) if durations.get(b) >= durations.get(p) => Some(b),
            _ => Some(p),
        });
        let Some(donor) = donor else { break };
        *durations.get_mut(donor) -= 1;
        deficit -= 1;
    }

    durations
}

/// Round to three decimals, half to even
fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

fn adjust_weights(base: &DomainWeights, profile: &AssessmentProfile) -> DomainWeights {
    let mut adjusted = base.clone();
    for (axis, domain) in AXIS_DOMAINS {
        let score = profile.score(axis);
        if let Some(weight) = adjusted.get_mut(&domain) {
            if score < WEAKNESS_THRESHOLD {
                *weight += WEAKNESS_BOOST;
            } else if score > STRENGTH_THRESHOLD {
                *weight = (*weight - STRENGTH_CUT).max(WEIGHT_FLOOR);
            }
        }
    }

    let total: f64 = adjusted.values().sum();
    if total > 0.0 {
        for weight in adjusted.values_mut() {
            *weight = round3(*weight / total);
        }
    }
    adjusted
}

/// Ordered, deduplicated session pool: sorted primaries, then sorted extras
#[must_use]
pub fn session_pool(phase: PhaseId) -> Vec<String> {
    let primary: BTreeSet<&str> = phases::primary_sessions(phase).iter().copied().collect();
    let available: BTreeSet<&str> = phases::available_sessions(phase)
        .iter()
        .copied()
        .filter(|s| !primary.contains(s))
        .collect();
    primary
        .into_iter()
        .chain(available)
        .map(str::to_owned)
        .collect()
}

/// Trips whose pre-trip window overlaps `[phase_start, phase_end]`
fn pretrip_annotations(
    trips: &[Trip],
    phase_start: NaiveDate,
    phase_end: NaiveDate,
    window_days: i64,
) -> Vec<PretripDeload> {
    trips
        .iter()
        .filter_map(|trip| {
            let trip_start = trip.start_date?;
            let deload_from = add_days(trip_start, -window_days);
            (deload_from <= phase_end && trip_start >= phase_start).then(|| PretripDeload {
                trip_name: trip.name.clone(),
                trip_start,
                deload_from,
            })
        })
        .collect()
}

fn goal_warnings(goal: &Goal) -> Vec<String> {
    let target = goal.target_grade.as_deref();
    let current = goal.current_grade.as_deref();
    let parsed_target = target.map(Grade::parse);
    let parsed_current = current.map(Grade::parse);

    let mut warnings = Vec::new();
    match (target, parsed_target, current, parsed_current) {
        (Some(t), Some(Ok(tg)), Some(c), Some(Ok(cg))) => {
            let gap = tg.gap(cg);
            if gap <= 0 {
                warnings.push(format!(
                    "target_grade ({t}) is not harder than current_grade ({c}). \
                     Consider setting a more ambitious target."
                ));
            } else if gap > MAX_GOAL_GAP {
                warnings.push(format!(
                    "target_grade ({t}) is {gap} half-grades above current_grade ({c}). \
                     A single macrocycle may not be sufficient."
                ));
            }
        }
        (Some(t), Some(Err(_)), _, _) => warnings.push(format!("Unknown target_grade: {t}")),
        (_, _, Some(c), Some(Err(_))) => warnings.push(format!("Unknown current_grade: {c}")),
        _ => {}
    }
    warnings
}

/// Generate a macrocycle
///
/// # Errors
///
/// Returns `PlanningError::TotalWeeksTooShort` when fewer than nine weeks are requested
pub fn generate_macrocycle(request: &MacrocycleRequest<'_>) -> Result<Macrocycle, PlanningError> {
    if request.total_weeks < phases::MIN_TOTAL_WEEKS {
        return Err(PlanningError::TotalWeeksTooShort {
            total_weeks: request.total_weeks,
            minimum: phases::MIN_TOTAL_WEEKS,
        });
    }

    let window_days = PlanningConfig::global().planner.pretrip_window_days;
    let durations = compute_durations(request.profile, request.total_weeks);

    let mut phase_list = Vec::with_capacity(PhaseId::ALL.len());
    let mut week = 1_u32;
    for phase_id in PhaseId::ALL {
        let duration = durations.get(phase_id);
        let start_week = week;
        let end_week = week + duration - 1;
        week = end_week + 1;

        let phase_start = add_days(request.start_date, 7 * i64::from(start_week - 1));
        let phase_end = add_days(phase_start, 7 * i64::from(duration) - 1);

        phase_list.push(Phase {
            phase_id,
            phase_name: phases::name(phase_id).to_owned(),
            start_week,
            end_week,
            duration_weeks: duration,
            energy_system: phases::energy_system(phase_id).to_owned(),
            domain_weights: adjust_weights(&phases::base_weights(phase_id), request.profile),
            session_pool: session_pool(phase_id),
            intensity_cap: phases::intensity_cap(phase_id),
            notes: phases::notes(phase_id).to_owned(),
            pretrip_deload: pretrip_annotations(request.trips, phase_start, phase_end, window_days),
        });
    }

    let macrocycle = Macrocycle {
        macrocycle_version: phases::MACROCYCLE_VERSION.to_owned(),
        generated_at: now_timestamp(),
        start_date: request.start_date,
        end_date: add_days(request.start_date, 7 * i64::from(request.total_weeks) - 1),
        goal_snapshot: GoalSnapshot {
            goal_type: request.goal.goal_type.clone(),
            target_grade: request.goal.target_grade.clone(),
            current_grade: request.goal.current_grade.clone(),
            deadline: request.goal.deadline.clone(),
        },
        assessment_snapshot: *request.profile,
        total_weeks: request.total_weeks,
        phases: phase_list,
        warnings: goal_warnings(request.goal),
    };

    info!(
        start_date = %macrocycle.start_date,
        total_weeks = macrocycle.total_weeks,
        warnings = macrocycle.warnings.len(),
        "macrocycle generated"
    );
    Ok(macrocycle)
}

// ============================================================================
// Week context
// ============================================================================

/// Phase index and 0-based week inside it for `today`, clamped to the macrocycle
#[must_use]
pub fn current_phase_and_week(macrocycle: &Macrocycle, today: NaiveDate) -> (usize, u32) {
    let elapsed = days_between(today, macrocycle.start_date);
    if elapsed < 0 {
        return (0, 0);
    }
    let week_index = (elapsed / 7) as u32;
    for (idx, phase) in macrocycle.phases.iter().enumerate() {
        let first = phase.start_week - 1;
        if week_index < first + phase.duration_weeks {
            return (idx, week_index.saturating_sub(first));
        }
    }
    macrocycle
        .phases
        .len()
        .checked_sub(1)
        .map_or((0, 0), |last| {
            (last, macrocycle.phases[last].duration_weeks.saturating_sub(1))
        })
}

/// Everything the week planner needs about one macrocycle week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekContext {
    /// Phase id
    pub phase_id: PhaseId,
    /// Full phase record
    pub phase: Phase,
    /// 1-based week number inside the macrocycle
    pub week_num: u32,
    /// Monday of the week
    pub start_date: NaiveDate,
    /// Phase domain weights
    pub domain_weights: DomainWeights,
    /// Phase session pool
    pub session_pool: Vec<String>,
    /// Phase intensity cap
    pub intensity_cap: Intensity,
    /// Last week of its phase (test sessions go here)
    pub is_last_week_of_phase: bool,
    /// Days of this week inside a pre-trip deload window
    pub pretrip_dates: Vec<NaiveDate>,
}

/// Resolve a week number (0 = the week containing `today`) to its phase context
///
/// # Errors
///
/// Returns `PlanningError::WeekOutOfRange` when `week_num` is past the last week,
/// or `MissingPrecondition` when the macrocycle has no phases
pub fn week_context(
    macrocycle: &Macrocycle,
    week_num: u32,
    today: NaiveDate,
) -> Result<WeekContext, PlanningError> {
    if week_num > macrocycle.total_weeks {
        return Err(PlanningError::WeekOutOfRange {
            week_num,
            total_weeks: macrocycle.total_weeks,
        });
    }

    let resolved_week = if week_num == 0 {
        let (idx, in_phase) = current_phase_and_week(macrocycle, today);
        macrocycle
            .phases
            .get(idx)
            .map_or(1, |p| p.start_week + in_phase)
    } else {
        week_num
    };

    let phase = macrocycle
        .phases
        .iter()
        .find(|p| (p.start_week..=p.end_week).contains(&resolved_week))
        .or_else(|| macrocycle.phases.last())
        .ok_or_else(|| PlanningError::missing_precondition("Macrocycle has no phases"))?;

    let start_date = add_days(macrocycle.start_date, 7 * i64::from(resolved_week - 1));
    let week_end = add_days(start_date, 6);
    let pretrip_dates = phase
        .pretrip_deload
        .iter()
        .flat_map(|p| {
            let span = days_between(p.trip_start, p.deload_from);
            (0..span).map(move |offset| add_days(p.deload_from, offset))
        })
        .filter(|d| *d >= start_date && *d <= week_end)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok(WeekContext {
        phase_id: phase.phase_id,
        phase: phase.clone(),
        week_num: resolved_week,
        start_date,
        domain_weights: phase.domain_weights.clone(),
        session_pool: phase.session_pool.clone(),
        intensity_cap: phase.intensity_cap,
        is_last_week_of_phase: resolved_week == phase.end_week,
        pretrip_dates,
    })
}

// ============================================================================
// Runtime checks
// ============================================================================

/// A trip close enough to trigger a mini deload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PretripAlert {
    /// Always `pretrip_deload`
    pub trigger: String,
    /// Trip name
    pub trip_name: Option<String>,
    /// Trip start date
    pub trip_start: NaiveDate,
    /// Days from `date` to the trip
    pub days_until_trip: i64,
    /// Coaching recommendation
    pub recommendation: String,
}

/// First trip starting within the pre-trip window after `date`
#[must_use]
pub fn check_pretrip_deload(trips: &[Trip], date: NaiveDate) -> Option<PretripAlert> {
    let window = PlanningConfig::global().planner.pretrip_window_days;
    trips.iter().find_map(|trip| {
        let trip_start = trip.start_date?;
        let days_until_trip = days_between(trip_start, date);
        (days_until_trip > 0 && days_until_trip <= window).then(|| PretripAlert {
            trigger: "pretrip_deload".to_owned(),
            trip_name: trip.name.clone(),
            trip_start,
            days_until_trip,
            recommendation: "Reduce volume and intensity. No max/high sessions.".to_owned(),
        })
    })
}

/// Extend a phase when the last two weekly labels are still hard
#[must_use]
pub fn should_extend_phase(weekly_feedback: &[FeedbackLabel]) -> bool {
    weekly_feedback.len() >= 2
        && weekly_feedback[weekly_feedback.len() - 2..]
            .iter()
            .all(|l| matches!(l, FeedbackLabel::Hard | FeedbackLabel::VeryHard))
}

/// Trigger a deload after five consecutive very hard days
#[must_use]
pub fn should_trigger_adaptive_deload(recent_feedback: &[FeedbackLabel]) -> bool {
    recent_feedback.len() >= 5
        && recent_feedback[recent_feedback.len() - 5..]
            .iter()
            .all(|l| *l == FeedbackLabel::VeryHard)
}

/// Turn a planned week into a deload week: no hard sessions, at most
/// `deload_max_sessions` kept across the week
pub fn apply_deload_week(plan: &mut WeekPlan) {
    let max_sessions = PlanningConfig::global().planner.deload_max_sessions;
    for week in &mut plan.weeks {
        let mut kept = 0_usize;
        for day in &mut week.days {
            day.sessions.retain(|session| {
                if kept >= max_sessions || session.tags.hard {
                    return false;
                }
                kept += 1;
                true
            });
        }
        week.phase = PhaseId::Deload;
        week.targets = WeekTargets {
            hard_days: 0,
            finger_days: 0,
            deload_factor: 0.5,
        };
    }
}
