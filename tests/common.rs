// ABOUTME: Shared fixtures for integration tests: logging, the shipped catalog, a climber state, coaches
// ABOUTME: Coaches run against a temporary data directory so tests never touch the repository data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `crux_coach`

use std::env;
use std::path::PathBuf;
use std::sync::Once;

use chrono::NaiveDate;
use crux_coach::catalog::load_catalog;
use crux_coach::coach::Coach;
use crux_coach::config::CoachConfig;
use crux_core::dates::parse_date;
use crux_core::models::{
    AssessmentProfile, AvailabilityInput, Catalog, Goal, PhaseId, PlanningPrefs, Slot, UserState,
    WeekAvailability, WeekPlan,
};
use crux_intelligence::macrocycle::session_pool;
use crux_intelligence::planner::{normalize_availability, planned_session, DEFAULT_LOCATIONS};
use crux_intelligence::training_constants::{phases, sessions};
use crux_intelligence::{plan_week, PlanRequest};
use serde_json::json;
use tempfile::TempDir;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub fn d(raw: &str) -> NaiveDate {
    parse_date(raw).unwrap()
}

/// Catalog directory shipped with the crate
pub fn catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("catalog")
}

/// The shipped catalog
pub fn data_catalog() -> Catalog {
    load_catalog(&catalog_dir()).expect("shipped catalog loads")
}

/// Profile of the macrocycle scenario: power endurance is the weakness
pub const fn pe_weak_profile() -> AssessmentProfile {
    AssessmentProfile {
        finger_strength: 60,
        pulling_strength: 55,
        power_endurance: 30,
        technique: 50,
        endurance: 40,
        body_composition: 65,
    }
}

pub fn lead_goal() -> Goal {
    Goal {
        goal_type: Some("lead_grade".to_owned()),
        target_grade: Some("7c+".to_owned()),
        current_grade: Some("7b".to_owned()),
        ..Goal::default()
    }
}

/// A lead climber with a home board setup and two gyms
pub fn climber_state() -> UserState {
    serde_json::from_value(json!({
        "user": {"id": "test_climber", "name": "Test Climber", "timezone": "Europe/Brussels"},
        "bodyweight_kg": 70.0,
        "body": {"weight_kg": 70.0, "height_cm": 176.0},
        "goal": {"goal_type": "lead_grade", "discipline": "lead", "target_grade": "7c+", "current_grade": "7b"},
        "assessment": {
            "body": {"weight_kg": 70.0},
            "experience": {"climbing_years": 8},
            "grades": {"lead_max_rp": "7b", "lead_max_os": "7a", "boulder_max_rp": "7A"},
            "tests": {"max_hang_20mm_5s_total_kg": 91.0, "weighted_pullup_1rm_total_kg": 95.0},
            "self_eval": {"primary_weakness": "pump_too_early"}
        },
        "equipment": {
            "home": ["hangboard", "pullup_bar", "resistance_band", "dumbbell"],
            "gyms": [
                {"gym_id": "blocx", "name": "Blocx", "priority": 1,
                 "equipment": ["spraywall", "board_kilter", "hangboard"]},
                {"gym_id": "sportcity", "name": "Sportcity", "priority": 2,
                 "equipment": ["lead_wall", "gym_boulder", "pullup_bar", "campus_board"]}
            ]
        },
        "planning_prefs": {"hard_day_cap_per_week": 3, "target_training_days_per_week": 4},
        "availability": {
            "mon": {"evening": {"locations": ["gym"], "gym_id": "blocx"}},
            "tue": {"evening": {"locations": ["home"]}},
            "wed": {"evening": {"locations": ["gym"], "gym_id": "sportcity"}},
            "thu": {"lunch": {"locations": ["home"]}},
            "fri": {"evening": {"locations": ["gym"], "gym_id": "blocx"}},
            "sat": {"morning": {"locations": ["gym", "home"], "preferred_location": "gym"}},
            "sun": {"available": false}
        }
    }))
    .expect("climber state fixture")
}

/// Coach over an empty temporary data directory and the shipped catalog
pub fn test_coach() -> (TempDir, Coach) {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let coach = Coach::with_catalog(CoachConfig::with_data_dir(dir.path()), data_catalog());
    (dir, coach)
}

/// Coach whose stored state is [`climber_state`]
pub fn seeded_coach() -> (TempDir, Coach) {
    let (dir, coach) = test_coach();
    coach.store().save(&climber_state()).unwrap();
    (dir, coach)
}

pub fn availability(value: serde_json::Value) -> WeekAvailability {
    let input: AvailabilityInput = serde_json::from_value(value).unwrap();
    normalize_availability(&input, &DEFAULT_LOCATIONS)
}

/// Every slot of every day open at gym and home
pub fn open_availability() -> WeekAvailability {
    normalize_availability(&AvailabilityInput::new(), &DEFAULT_LOCATIONS)
}

/// Plan one week of `phase` from the phase tables
pub fn plan_phase_week(
    phase: PhaseId,
    start: NaiveDate,
    week: &WeekAvailability,
    prefs: &PlanningPrefs,
) -> WeekPlan {
    let pool = session_pool(phase);
    let weights = phases::base_weights(phase);
    let state = climber_state();
    plan_week(&PlanRequest {
        phase_id: phase,
        domain_weights: &weights,
        session_pool: &pool,
        start_date: start,
        availability: week,
        allowed_locations: &DEFAULT_LOCATIONS,
        hard_cap_per_week: 3,
        planning_prefs: prefs,
        default_gym_id: Some("blocx"),
        gyms: &state.equipment.gyms,
        intensity_cap: None,
        pretrip_dates: &[],
        is_last_week_of_phase: false,
    })
}

/// A seven-day plan starting `start` with exactly the given sessions
///
/// `layout` holds `(day offset, session id, slot)`; every other day is empty.
pub fn plan_with_sessions(start: NaiveDate, layout: &[(usize, &str, Slot)]) -> WeekPlan {
    let closed = availability(json!({
        "mon": {"available": false}, "tue": {"available": false}, "wed": {"available": false},
        "thu": {"available": false}, "fri": {"available": false}, "sat": {"available": false},
        "sun": {"available": false}
    }));
    let prefs = PlanningPrefs {
        hard_day_cap_per_week: Some(3),
        target_training_days_per_week: Some(4),
        default_gym_id: Some("blocx".to_owned()),
    };
    let mut plan = plan_phase_week(PhaseId::StrengthPower, start, &closed, &prefs);
    for (offset, session_id, slot) in layout {
        let location = sessions::lookup_or_default(session_id).locations[0];
        let day = &mut plan.days_mut()[*offset];
        day.sessions.push(planned_session(
            session_id,
            *slot,
            location,
            Some("blocx".to_owned()),
            PhaseId::StrengthPower,
        ));
        day.sort_sessions();
    }
    plan
}
