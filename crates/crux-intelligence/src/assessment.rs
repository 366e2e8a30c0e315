// ABOUTME: Assessment engine reducing tests, grades, and self-evaluation to a six-axis profile
// ABOUTME: Benchmarks are total-load to bodyweight ratios indexed by the target sport grade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Assessment Engine
//!
//! Each axis is scored independently and clamped to `0..=100`:
//!
//! - finger and pulling strength compare a test ratio against the benchmark
//!   for the target grade, or estimate from `current / target` grade index
//! - power endurance and technique key off the lead redpoint/onsight gap
//! - endurance builds on power endurance plus climbing years
//! - body composition uses body-fat bands, else a proxy from finger strength

use crux_core::errors::PlanningError;
use crux_core::grades::Grade;
use crux_core::models::{AssessmentInputs, AssessmentProfile, Goal, ReportedGrades, SelfEvaluation};
use tracing::debug;

use crate::training_constants::benchmarks;

/// Bodyweight assumed when the user gave none
const DEFAULT_BODYWEIGHT_KG: f64 = 70.0;
/// Target grade assumed when the goal names none
pub const DEFAULT_TARGET_GRADE: &str = "7c+";
/// Current grade assumed when the goal names none
pub const DEFAULT_CURRENT_GRADE: &str = "7a";

const NEUTRAL: f64 = 50.0;

/// Round half to even and clamp to the score range
fn clamp_score(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Sport-ladder index of a grade, mapping Font grades across
fn sport_index(grade: Grade) -> usize {
    grade.to_sport_equivalent().index()
}

/// Grade context shared by the two strength axes
struct GradeContext {
    target_index: usize,
    current_index: usize,
}

impl GradeContext {
    fn from_goal(goal: &Goal) -> Result<Self, PlanningError> {
        let target_raw = goal.target_grade.as_deref().unwrap_or(DEFAULT_TARGET_GRADE);
        let current_raw = goal
            .current_grade
            .as_deref()
            .unwrap_or(DEFAULT_CURRENT_GRADE);
        let target_index = sport_index(Grade::parse(target_raw)?);
        let current_index = Grade::parse(current_raw).map(sport_index).unwrap_or(0);
        Ok(Self {
            target_index,
            current_index,
        })
    }

    /// `current / target × scale`, neutral when the target sits at the bottom
    fn estimate(&self, scale: f64) -> f64 {
        if self.target_index == 0 {
            NEUTRAL
        } else {
            self.current_index as f64 / self.target_index as f64 * scale
        }
    }
}

fn strength_axis(
    test_total_kg: Option<f64>,
    bodyweight: f64,
    benchmark: f64,
    estimate: f64,
    weakness_penalty: f64,
) -> u8 {
    let score = test_total_kg.map_or(estimate - weakness_penalty, |total| {
        total / bodyweight / benchmark * 100.0
    });
    clamp_score(score)
}

/// Redpoint minus onsight in half-grades, when both are known
fn redpoint_gap(grades: &ReportedGrades) -> Option<i64> {
    let rp = Grade::parse(grades.lead_max_rp.as_deref()?).ok()?;
    let os = Grade::parse(grades.lead_max_os.as_deref()?).ok()?;
    Some(rp.gap(os))
}

fn power_endurance(gap: Option<i64>, self_eval: &SelfEvaluation) -> u8 {
    let base = match gap {
        None => NEUTRAL,
        Some(g) if g <= 2 => 75.0,
        Some(g) if g <= 4 => 55.0,
        Some(g) if g <= 6 => 40.0,
        Some(_) => 30.0,
    };
    clamp_score(base - self_eval.penalty(&["pump_too_early"], 15.0, 8.0))
}

fn technique(gap: Option<i64>, self_eval: &SelfEvaluation) -> u8 {
    let base = match gap {
        None => NEUTRAL,
        Some(g) if g <= 2 => 80.0,
        Some(g) if g <= 4 => 60.0,
        Some(g) if g <= 6 => 40.0,
        Some(_) => 30.0,
    };
    clamp_score(base - self_eval.penalty(&["technique_errors", "cant_read_routes"], 10.0, 5.0))
}

fn endurance(pe_score: u8, climbing_years: f64, self_eval: &SelfEvaluation) -> u8 {
    let score = f64::from(pe_score).mul_add(0.8, (climbing_years * 2.0).min(10.0))
        - self_eval.penalty(&["pump_too_early"], 10.0, 5.0)
        - self_eval.penalty(&["cant_manage_rests"], 10.0, 5.0);
    clamp_score(score)
}

fn body_composition(body_fat_pct: Option<f64>, finger_score: u8) -> u8 {
    let score = body_fat_pct.map_or_else(
        || (f64::from(finger_score) * 0.9).min(70.0),
        |bf| {
            const BANDS: [(f64, f64); 7] = [
                (10.0, 95.0),
                (12.0, 85.0),
                (14.0, 78.0),
                (16.0, 70.0),
                (18.0, 60.0),
                (20.0, 50.0),
                (25.0, 35.0),
            ];
            BANDS
                .iter()
                .find(|(limit, _)| bf <= *limit)
                .map_or(20.0, |(_, score)| *score)
        },
    );
    clamp_score(score)
}

/// Compute the six-axis profile
///
/// # Errors
///
/// Returns `PlanningError::UnknownGrade` when the goal's target grade is not
/// on either ladder. An unknown current grade is treated as the bottom of the
/// ladder.
pub fn assess(inputs: &AssessmentInputs, goal: &Goal) -> Result<AssessmentProfile, PlanningError> {
    let grades = GradeContext::from_goal(goal)?;
    let bodyweight = inputs
        .body
        .weight_kg
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_BODYWEIGHT_KG);
    let self_eval = &inputs.self_eval;

    let finger_strength = strength_axis(
        inputs.tests.max_hang_20mm_5s_total_kg,
        bodyweight,
        benchmarks::ratio(&benchmarks::FINGER, grades.target_index),
        grades.estimate(70.0),
        self_eval.penalty(&["fingers_give_out"], 15.0, 8.0),
    );
    let pulling_strength = strength_axis(
        inputs.tests.weighted_pullup_1rm_total_kg,
        bodyweight,
        benchmarks::ratio(&benchmarks::PULLING, grades.target_index),
        grades.estimate(65.0),
        self_eval.penalty(&["cant_hold_hard_moves"], 10.0, 5.0),
    );

    let gap = redpoint_gap(&inputs.grades);
    let power_endurance = power_endurance(gap, self_eval);
    let technique = technique(gap, self_eval);
    let endurance = endurance(
        power_endurance,
        inputs.experience.climbing_years.unwrap_or(0.0),
        self_eval,
    );
    let body_composition = body_composition(inputs.body.body_fat_pct, finger_strength);

    let profile = AssessmentProfile {
        finger_strength,
        pulling_strength,
        power_endurance,
        technique,
        endurance,
        body_composition,
    };
    debug!(?profile, "assessment profile computed");
    Ok(profile)
}
