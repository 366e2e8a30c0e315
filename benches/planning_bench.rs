// ABOUTME: Criterion benchmarks for the planning engines over the shipped catalog
// ABOUTME: Measures macrocycle generation, week planning, session resolution, and replanning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Criterion benchmarks for the planning pipeline.
//!
//! Every benchmark runs against the catalog under `data/catalog` and a fixed
//! climber so numbers stay comparable between runs.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs
)]

use std::path::PathBuf;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crux_coach::catalog::load_catalog;
use crux_core::models::{
    AssessmentProfile, Catalog, Goal, Location, PhaseId, ReplanEvent, Slot, UserState,
};
use crux_intelligence::macrocycle::session_pool;
use crux_intelligence::planner::{normalize_availability, DEFAULT_LOCATIONS};
use crux_intelligence::training_constants::phases;
use crux_intelligence::{
    apply_events, generate_macrocycle, plan_week, resolve_session, MacrocycleRequest,
    PlanRequest, ReplanContext, ResolveRequest,
};
use serde_json::json;

const START: (i32, u32, u32) = (2026, 3, 2);

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(START.0, START.1, START.2).expect("valid start date")
}

fn catalog() -> Catalog {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("catalog");
    load_catalog(&dir).expect("shipped catalog loads")
}

fn climber() -> UserState {
    serde_json::from_value(json!({
        "user": {"id": "bench_climber"},
        "bodyweight_kg": 68.0,
        "goal": {"goal_type": "lead_grade", "target_grade": "7c", "current_grade": "7b"},
        "equipment": {
            "home": ["hangboard", "pullup_bar", "resistance_band"],
            "gyms": [
                {"gym_id": "blocx", "name": "Blocx", "priority": 1,
                 "equipment": ["spraywall", "board_kilter", "hangboard"]},
                {"gym_id": "sportcity", "name": "Sportcity", "priority": 2,
                 "equipment": ["lead_wall", "gym_boulder", "campus_board"]}
            ]
        },
        "planning_prefs": {"hard_day_cap_per_week": 3, "target_training_days_per_week": 5},
        "availability": {
            "mon": {"evening": {"locations": ["gym"], "gym_id": "blocx"}},
            "tue": {"evening": {"locations": ["home"]}},
            "wed": {"evening": {"locations": ["gym"], "gym_id": "sportcity"}},
            "thu": {"lunch": {"locations": ["home"]}},
            "fri": {"evening": {"locations": ["gym"], "gym_id": "blocx"}},
            "sat": {"morning": {"locations": ["gym", "home"]}},
            "sun": {"available": false}
        }
    }))
    .expect("bench climber state")
}

const PROFILE: AssessmentProfile = AssessmentProfile {
    finger_strength: 55,
    pulling_strength: 60,
    power_endurance: 35,
    technique: 50,
    endurance: 45,
    body_composition: 70,
};

fn bench_macrocycle(c: &mut Criterion) {
    let goal = Goal {
        goal_type: Some("lead_grade".to_owned()),
        target_grade: Some("7c".to_owned()),
        current_grade: Some("7b".to_owned()),
        ..Goal::default()
    };
    let mut group = c.benchmark_group("macrocycle");

    for weeks in [9_u32, 12, 20] {
        group.bench_with_input(BenchmarkId::new("generate", weeks), &weeks, |b, &weeks| {
            b.iter(|| {
                generate_macrocycle(black_box(&MacrocycleRequest {
                    goal: &goal,
                    profile: &PROFILE,
                    trips: &[],
                    start_date: start_date(),
                    total_weeks: weeks,
                }))
            });
        });
    }

    group.finish();
}

fn bench_week_planner(c: &mut Criterion) {
    let state = climber();
    let week = normalize_availability(&state.availability, &DEFAULT_LOCATIONS);
    let mut group = c.benchmark_group("week_planner");

    for phase in [PhaseId::Base, PhaseId::StrengthPower, PhaseId::PowerEndurance] {
        let pool = session_pool(phase);
        let weights = phases::base_weights(phase);
        group.bench_function(BenchmarkId::new("plan_week", format!("{phase:?}")), |b| {
            b.iter(|| {
                plan_week(black_box(&PlanRequest {
                    phase_id: phase,
                    domain_weights: &weights,
                    session_pool: &pool,
                    start_date: start_date(),
                    availability: &week,
                    allowed_locations: &DEFAULT_LOCATIONS,
                    hard_cap_per_week: 3,
                    planning_prefs: &state.planning_prefs,
                    default_gym_id: Some("blocx"),
                    gyms: &state.equipment.gyms,
                    intensity_cap: Some(phases::intensity_cap(phase)),
                    pretrip_dates: &[],
                    is_last_week_of_phase: false,
                }))
            });
        });
    }

    group.finish();
}

fn bench_resolver(c: &mut Criterion) {
    let catalog = catalog();
    let state = climber();
    let mut group = c.benchmark_group("resolver");

    let cases = [
        ("strength_long", Location::Gym, Some("blocx")),
        ("finger_strength_home", Location::Home, None),
        ("power_endurance_gym", Location::Gym, Some("sportcity")),
    ];
    for (session_id, location, gym) in cases {
        group.bench_function(BenchmarkId::new("resolve", session_id), |b| {
            b.iter(|| {
                resolve_session(black_box(
                    &ResolveRequest::new(session_id, &catalog, &state)
                        .with_location(Some(location))
                        .with_gym(gym)
                        .with_date(Some(start_date())),
                ))
            });
        });
    }

    group.finish();
}

fn bench_replanner(c: &mut Criterion) {
    let state = climber();
    let week = normalize_availability(&state.availability, &DEFAULT_LOCATIONS);
    let pool = session_pool(PhaseId::StrengthPower);
    let weights = phases::base_weights(PhaseId::StrengthPower);
    let plan = plan_week(&PlanRequest {
        phase_id: PhaseId::StrengthPower,
        domain_weights: &weights,
        session_pool: &pool,
        start_date: start_date(),
        availability: &week,
        allowed_locations: &DEFAULT_LOCATIONS,
        hard_cap_per_week: 3,
        planning_prefs: &state.planning_prefs,
        default_gym_id: Some("blocx"),
        gyms: &state.equipment.gyms,
        intensity_cap: None,
        pretrip_dates: &[],
        is_last_week_of_phase: false,
    });
    let events = [ReplanEvent::MarkSkipped {
        date: start_date(),
        slot: Some(Slot::Evening),
        session_ref: None,
    }];

    c.bench_function("replanner/mark_skipped", |b| {
        b.iter(|| {
            let mut context = ReplanContext::new(
                week.clone(),
                &state.planning_prefs,
                &state.equipment.gyms,
            );
            apply_events(black_box(&plan), &events, &mut context)
        });
    });
}

criterion_group!(
    benches,
    bench_macrocycle,
    bench_week_planner,
    bench_resolver,
    bench_replanner,
);
criterion_main!(benches);
