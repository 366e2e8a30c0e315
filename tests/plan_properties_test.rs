// ABOUTME: Invariant checks over macrocycles, week plans, resolution, progression, and replanning
// ABOUTME: Each property is exercised across a grid of profiles, lengths, and availabilities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::NaiveDate;
use common::{
    climber_state, d, data_catalog, lead_goal, open_availability, pe_weak_profile,
    plan_with_sessions,
};
use crux_core::models::{
    AssessmentProfile, DaySession, Goal, Intensity, Location, Macrocycle, PhaseId, PlanDay,
    PlannedInstance, PlanningPrefs, ReplanEvent, ResolvedDay, SessionLogEntry, SessionStatus,
    Slot, Trip, WeekAvailability, WeekPlan,
};
use crux_intelligence::macrocycle::week_context;
use crux_intelligence::planner::{normalize_availability, DEFAULT_LOCATIONS};
use crux_intelligence::{
    apply_day_override, apply_events, apply_feedback, generate_macrocycle, inject_targets,
    plan_week, regenerate_preserving_completed, resolve_session, DayOverride, MacrocycleRequest,
    PlanRequest, ReplanContext, ResolveRequest,
};
use serde_json::{json, Value};

const CANONICAL_ORDER: [PhaseId; 5] = [
    PhaseId::Base,
    PhaseId::StrengthPower,
    PhaseId::PowerEndurance,
    PhaseId::Performance,
    PhaseId::Deload,
];

fn profiles() -> Vec<AssessmentProfile> {
    vec![
        pe_weak_profile(),
        AssessmentProfile {
            finger_strength: 30,
            pulling_strength: 70,
            power_endurance: 60,
            technique: 55,
            endurance: 65,
            body_composition: 70,
        },
        AssessmentProfile {
            finger_strength: 50,
            pulling_strength: 50,
            power_endurance: 50,
            technique: 50,
            endurance: 50,
            body_composition: 50,
        },
    ]
}

fn goals() -> Vec<Goal> {
    vec![
        lead_goal(),
        Goal {
            goal_type: Some("lead_grade".to_owned()),
            target_grade: Some("7a+".to_owned()),
            current_grade: Some("6c".to_owned()),
            ..Goal::default()
        },
    ]
}

fn trip() -> Trip {
    serde_json::from_value(json!({
        "name": "Siurana",
        "start_date": "2026-04-20",
        "end_date": "2026-04-26"
    }))
    .unwrap()
}

fn macrocycles() -> Vec<Macrocycle> {
    let trips = [trip()];
    let mut out = Vec::new();
    for profile in profiles() {
        for goal in goals() {
            for total_weeks in 9..=20 {
                for trip_list in [&trips[..0], &trips[..]] {
                    out.push(
                        generate_macrocycle(&MacrocycleRequest {
                            goal: &goal,
                            profile: &profile,
                            trips: trip_list,
                            start_date: d("2026-03-02"),
                            total_weeks,
                        })
                        .unwrap(),
                    );
                }
            }
        }
    }
    out
}

fn rank(phase: PhaseId) -> usize {
    CANONICAL_ORDER.iter().position(|p| *p == phase).unwrap()
}

fn gap_ok(dates: &[NaiveDate]) -> bool {
    dates.windows(2).all(|w| (w[1] - w[0]).num_days() >= 2)
}

fn dates_where(plan: &WeekPlan, predicate: impl Fn(&PlanDay) -> bool) -> Vec<NaiveDate> {
    plan.days()
        .iter()
        .filter(|day| predicate(day))
        .map(|day| day.date)
        .collect()
}

fn assert_week_invariants(plan: &WeekPlan, cap: Intensity, pretrip: &[NaiveDate], prefs: &PlanningPrefs) {
    let hard_days = plan.days().iter().filter(|day| day.has_hard()).count();
    assert!(hard_days <= 3, "{hard_days} hard days");

    assert!(gap_ok(&dates_where(plan, |day| day.has_finger())));
    assert!(gap_ok(&dates_where(plan, |day| {
        day.sessions.iter().any(|s| s.intensity == Intensity::Max)
    })));

    let placed = plan.days().iter().filter(|day| !day.sessions.is_empty()).count();
    let target = prefs.target_training_days_per_week.unwrap_or(4) as usize;
    assert!(placed <= target, "{placed} days placed for target {target}");

    for day in plan.days() {
        assert!(day.sessions.iter().all(|s| s.intensity <= cap));
        if pretrip.contains(&day.date) {
            assert!(!day.has_hard(), "hard session on pre-trip day {}", day.date);
        }
    }
}

#[test]
fn test_macrocycle_phase_weeks_sum_and_order() {
    for macrocycle in macrocycles() {
        let total: u32 = macrocycle.phases.iter().map(|p| p.duration_weeks).sum();
        assert_eq!(total, macrocycle.total_weeks);
        assert!(macrocycle.total_weeks >= 9);
        assert_eq!(macrocycle.phases.last().unwrap().phase_id, PhaseId::Deload);
        let ranks: Vec<usize> = macrocycle.phases.iter().map(|p| rank(p.phase_id)).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]), "order {ranks:?}");
    }
}

#[test]
fn test_macrocycle_rejects_short_cycles() {
    let result = generate_macrocycle(&MacrocycleRequest {
        goal: &lead_goal(),
        profile: &pe_weak_profile(),
        trips: &[],
        start_date: d("2026-03-02"),
        total_weeks: 8,
    });
    assert!(result.is_err());
}

#[test]
fn test_domain_weights_sum_to_one() {
    for macrocycle in macrocycles() {
        for phase in &macrocycle.phases {
            let sum: f64 = phase.domain_weights.values().sum();
            assert!((sum - 1.0).abs() <= 0.01, "{:?} sums to {sum}", phase.phase_id);
        }
    }
}

#[test]
fn test_every_week_respects_plan_invariants() {
    let state = climber_state();
    let stored = normalize_availability(&state.availability, &DEFAULT_LOCATIONS);
    let open = open_availability();
    let availabilities: [&WeekAvailability; 2] = [&stored, &open];
    let prefs_grid = [
        state.planning_prefs.clone(),
        PlanningPrefs {
            hard_day_cap_per_week: Some(3),
            target_training_days_per_week: Some(2),
            default_gym_id: None,
        },
        PlanningPrefs {
            hard_day_cap_per_week: Some(3),
            target_training_days_per_week: Some(6),
            default_gym_id: None,
        },
    ];

    for macrocycle in macrocycles().into_iter().step_by(5) {
        for week_num in 1..=macrocycle.total_weeks {
            let context = week_context(&macrocycle, week_num, macrocycle.start_date).unwrap();
            for availability in availabilities {
                for prefs in &prefs_grid {
                    let request = PlanRequest::from_context(
                        &context,
                        availability,
                        prefs,
                        &state.equipment.gyms,
                        Some("blocx"),
                    );
                    let plan = plan_week(&request);
                    assert_week_invariants(&plan, context.intensity_cap, &context.pretrip_dates, prefs);
                }
            }
        }
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let catalog = data_catalog();
    let state = climber_state();
    let recent = vec!["arm_circles".to_owned(), "dead_bug".to_owned()];
    for session_id in ["strength_long", "power_contact_gym", "prehab_maintenance", "technique_focus_gym"] {
        let run = || {
            let resolved = resolve_session(
                &ResolveRequest::new(session_id, &catalog, &state)
                    .with_location(Some(Location::Gym))
                    .with_gym(Some("blocx"))
                    .with_date(Some(d("2026-03-03")))
                    .with_recent(&recent),
            )
            .unwrap();
            let mut value = serde_json::to_value(resolved).unwrap();
            value["generated_at"] = Value::Null;
            serde_json::to_string(&value).unwrap()
        };
        assert_eq!(run(), run(), "{session_id} resolved differently");
    }
}

#[test]
fn test_feedback_then_targets_is_steady() {
    let state = climber_state();
    let entry: SessionLogEntry = serde_json::from_value(json!({
        "date": "2026-03-03",
        "planned": [{"session_id": "strength_long", "exercise_instances": [
            {"exercise_id": "max_hang_5s", "prescription": {"edge_mm": 20, "grip": "half_crimp"}}
        ]}],
        "actual": {"exercise_feedback_v1": [
            {"exercise_id": "max_hang_5s", "used_external_load_kg": 14.0,
             "feedback_label": "ok", "completed": true}
        ]}
    }))
    .unwrap();
    let updated = apply_feedback(&entry, &state);
    let next = updated
        .working_loads
        .entries
        .iter()
        .find(|e| e.exercise_id == "max_hang_5s")
        .and_then(|e| e.next_external_load_kg)
        .unwrap();

    let day = ResolvedDay {
        date: d("2026-03-05"),
        sessions: vec![DaySession {
            session_id: "strength_long".to_owned(),
            exercise_instances: vec![PlannedInstance {
                exercise_id: "max_hang_5s".to_owned(),
                prescription: serde_json::from_value(json!({"edge_mm": 20, "grip": "half_crimp"}))
                    .unwrap(),
                ..PlannedInstance::default()
            }],
            ..DaySession::default()
        }],
        plan: None,
        resolved_ref: None,
    };
    let once = inject_targets(&day, &updated);
    let twice = inject_targets(&once, &updated);
    let suggested = |day: &ResolvedDay| {
        day.sessions[0].exercise_instances[0]
            .suggested
            .as_ref()
            .and_then(|s| s.suggested_external_load_kg)
    };
    assert_eq!(suggested(&once), Some(next));
    assert_eq!(suggested(&twice), Some(next));
}

#[test]
fn test_hard_override_clears_the_next_two_days() {
    let plan = plan_with_sessions(
        d("2026-03-02"),
        &[
            (0, "prehab_maintenance", Slot::Evening),
            (1, "technique_focus_gym", Slot::Evening),
            (2, "power_contact_gym", Slot::Evening),
            (3, "power_endurance_gym", Slot::Evening),
            (5, "finger_strength_home", Slot::Evening),
        ],
    );
    let updated = apply_day_override(
        &plan,
        &DayOverride {
            intent: "strength".to_owned(),
            location: Location::Gym,
            reference_date: d("2026-03-02"),
            slot: Slot::Evening,
            phase_id: None,
            target_date: None,
            gym_id: None,
        },
    )
    .unwrap();

    let target = updated.day(d("2026-03-03")).unwrap();
    assert_eq!(target.sessions.len(), 1);
    assert_eq!(target.sessions[0].session_id, "strength_long");
    assert!(!updated.day(d("2026-03-04")).unwrap().has_hard());
    assert!(!updated.day(d("2026-03-05")).unwrap().has_hard());
}

#[test]
fn test_mark_done_and_mark_skipped_shapes() {
    let plan = plan_with_sessions(
        d("2026-03-02"),
        &[
            (0, "strength_long", Slot::Morning),
            (0, "prehab_maintenance", Slot::Evening),
            (2, "power_contact_gym", Slot::Evening),
        ],
    );
    let state = climber_state();
    let mut context = ReplanContext::new(
        normalize_availability(&state.availability, &DEFAULT_LOCATIONS),
        &state.planning_prefs,
        &state.equipment.gyms,
    );
    let events = [
        ReplanEvent::MarkDone {
            date: d("2026-03-02"),
            session_ref: Some("strength_long".to_owned()),
            slot: None,
        },
        ReplanEvent::MarkSkipped {
            date: d("2026-03-04"),
            session_ref: None,
            slot: Some(Slot::Evening),
        },
    ];
    let updated = apply_events(&plan, &events, &mut context).unwrap();

    let monday = updated.day(d("2026-03-02")).unwrap();
    assert_eq!(monday.sessions.len(), 2);
    let done = monday.sessions.iter().find(|s| s.session_id == "strength_long").unwrap();
    assert_eq!(done.status, Some(SessionStatus::Done));

    let wednesday = updated.day(d("2026-03-04")).unwrap();
    assert_eq!(wednesday.status, Some(SessionStatus::Skipped));
    assert_eq!(wednesday.sessions.len(), 1);
    assert_eq!(wednesday.sessions[0].slot, Slot::Evening);
    assert_eq!(wednesday.sessions[0].session_id, "regeneration_easy");
}

#[test]
fn test_regeneration_keeps_completed_sessions_in_place() {
    let mut old = plan_with_sessions(
        d("2026-03-02"),
        &[
            (0, "strength_long", Slot::Morning),
            (2, "power_contact_gym", Slot::Evening),
            (4, "prehab_maintenance", Slot::Lunch),
        ],
    );
    old.days_mut()[0].sessions[0].status = Some(SessionStatus::Done);
    old.days_mut()[2].sessions[0].status = Some(SessionStatus::Skipped);

    let fresh = plan_with_sessions(
        d("2026-03-02"),
        &[
            (0, "technique_focus_gym", Slot::Morning),
            (1, "finger_strength_home", Slot::Evening),
        ],
    );
    let merged = regenerate_preserving_completed(&old, &fresh);

    for old_day in old.days() {
        for session in old_day.sessions.iter().filter(|s| s.is_completed()) {
            let day = merged.day(old_day.date).unwrap();
            let kept = day
                .sessions
                .iter()
                .find(|s| s.slot == session.slot)
                .unwrap();
            assert_eq!(kept.session_id, session.session_id);
            assert_eq!(kept.status, session.status);
        }
    }
    let friday = merged.day(d("2026-03-06")).unwrap();
    assert!(friday.sessions.is_empty());
    assert_eq!(merged.plan_revision, fresh.plan_revision + 1);
}
