// ABOUTME: Onboarding chain turning the intake form into a stored state, a profile, and a macrocycle
// ABOUTME: Builds the v1.5 state, fills the goal's current grade, assesses, and plans 12 weeks from next Monday
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::dates::{next_monday, now_timestamp, today};
use crux_core::errors::AppResult;
use crux_core::models::{
    AssessmentInputs, BodyMetrics, Discipline, Limitations, PlanningPrefs, ReportedGrades,
    UserProfile, UserState,
};
use crux_intelligence::closed_loop::ensure_planning_defaults;
use crux_intelligence::{assess, generate_macrocycle, MacrocycleRequest};
use serde_json::{json, Map, Value};
use tracing::info;

use super::{Coach, OnboardingIntake, OnboardingResponse};

const DEFAULT_TIMEZONE: &str = "Europe/Brussels";
const ONBOARDING_WEEKS: u32 = 12;
const DEFAULT_LEAD_GRADE: &str = "7a";
const DEFAULT_BOULDER_GRADE: &str = "6A";

/// `Jane Doe` becomes `jane_doe`
fn user_id(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("user")
        .to_lowercase()
        .replace(' ', "_")
}

/// `elbow` + `left` becomes `elbow_left`; no side means both
fn limitation_flags(details: &[Value]) -> Vec<String> {
    details
        .iter()
        .filter_map(|detail| {
            let area = detail.get("area").and_then(Value::as_str)?;
            let side = detail.get("side").and_then(Value::as_str).unwrap_or("both");
            Some(format!("{area}_{side}"))
        })
        .collect()
}

/// `{worked?, onsight?}` for one discipline, or nothing when neither is reported
fn level_entry(worked: Option<&String>, onsight: Option<&String>) -> Option<Value> {
    let mut entry = Map::new();
    if let Some(grade) = worked {
        entry.insert("worked".to_owned(), json!({ "grade": grade }));
    }
    if let Some(grade) = onsight {
        entry.insert("onsight".to_owned(), json!({ "grade": grade }));
    }
    (!entry.is_empty()).then_some(Value::Object(entry))
}

/// `performance.current_level` seeded from the reported grades
fn current_level(grades: &ReportedGrades) -> Value {
    let mut level = Map::new();
    level.insert("updated_at".to_owned(), Value::Null);
    if let Some(sport) = level_entry(grades.lead_max_rp.as_ref(), grades.lead_max_os.as_ref()) {
        level.insert("sport".to_owned(), sport);
    }
    if let Some(boulder) =
        level_entry(grades.boulder_max_rp.as_ref(), grades.boulder_max_os.as_ref())
    {
        level.insert("boulder".to_owned(), boulder);
    }
    Value::Object(level)
}

/// State built from the intake, before assessment
pub(super) fn state_from_intake(intake: OnboardingIntake) -> UserState {
    let profile = intake.profile;
    let body = BodyMetrics {
        weight_kg: profile.weight_kg,
        height_cm: profile.height_cm,
        body_fat_pct: profile.body_fat_pct,
        ..BodyMetrics::default()
    };

    let mut goal = intake.goal;
    if goal.current_grade.is_none() {
        goal.current_grade = Some(match goal.discipline {
            Some(Discipline::Boulder) => intake
                .grades
                .boulder_max_rp
                .clone()
                .unwrap_or_else(|| DEFAULT_BOULDER_GRADE.to_owned()),
            _ => intake
                .grades
                .lead_max_rp
                .clone()
                .unwrap_or_else(|| DEFAULT_LEAD_GRADE.to_owned()),
        });
    }

    let mut performance = Map::new();
    performance.insert("current_level".to_owned(), current_level(&intake.grades));

    let mut units = Map::new();
    units.insert("units".to_owned(), json!({"distance": "km", "edge": "mm", "weight": "kg"}));

    UserState {
        user: UserProfile {
            id: Some(user_id(profile.name.as_deref())),
            name: profile.name,
            preferred_name: profile.preferred_name,
            timezone: Some(DEFAULT_TIMEZONE.to_owned()),
            extra: units,
        },
        bodyweight_kg: profile.weight_kg,
        assessment: AssessmentInputs {
            body: body.clone(),
            experience: intake.experience,
            grades: intake.grades,
            tests: intake.tests,
            self_eval: intake.self_eval,
            profile: None,
            last_assessed: None,
        },
        body,
        goal,
        planning_prefs: intake.planning_prefs.unwrap_or(PlanningPrefs {
            hard_day_cap_per_week: Some(3),
            target_training_days_per_week: Some(4),
            default_gym_id: None,
        }),
        availability: intake.availability,
        equipment: intake.equipment,
        limitations: Limitations {
            active_flags: limitation_flags(&intake.limitations),
            details: intake.limitations,
        },
        trips: intake.trips,
        performance,
        ..UserState::empty()
    }
}

impl Coach {
    /// Complete onboarding (`POST /onboarding/complete`)
    ///
    /// The built state is saved before assessment, so a failed assessment or
    /// macrocycle leaves the intake on disk. The macrocycle starts next Monday.
    ///
    /// # Errors
    ///
    /// Returns an engine error for unknown grades or an unusable goal, or a
    /// storage error
    pub fn complete_onboarding(&self, intake: OnboardingIntake) -> AppResult<OnboardingResponse> {
        let mut state = state_from_intake(intake);
        ensure_planning_defaults(&mut state);
        self.store.save(&state)?;

        let profile = assess(&state.assessment, &state.goal)?;
        state.assessment.profile = Some(profile);
        state.assessment.last_assessed = Some(now_timestamp());
        self.store.save(&state)?;

        let macrocycle = generate_macrocycle(&MacrocycleRequest {
            goal: &state.goal,
            profile: &profile,
            trips: &state.trips,
            start_date: next_monday(today()),
            total_weeks: ONBOARDING_WEEKS,
        })?;
        state.macrocycle = Some(macrocycle.clone());
        state.invalidate_week_cache();
        self.store.save(&state)?;

        info!(
            user = state.user.id.as_deref().unwrap_or_default(),
            start = %macrocycle.start_date,
            "onboarding complete"
        );
        Ok(OnboardingResponse {
            profile,
            macrocycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crux_core::models::Goal;

    #[test]
    fn test_user_id_and_flags() {
        assert_eq!(user_id(Some("Jane Doe")), "jane_doe");
        assert_eq!(user_id(None), "user");
        let flags = limitation_flags(&[
            json!({"area": "elbow", "side": "left"}),
            json!({"area": "shoulder"}),
            json!({"note": "no area"}),
        ]);
        assert_eq!(flags, vec!["elbow_left", "shoulder_both"]);
    }

    #[test]
    fn test_current_grade_filled_from_discipline() {
        let intake = OnboardingIntake {
            grades: ReportedGrades {
                lead_max_rp: Some("7b".to_owned()),
                boulder_max_rp: Some("7A".to_owned()),
                ..ReportedGrades::default()
            },
            goal: Goal {
                discipline: Some(Discipline::Boulder),
                target_grade: Some("7B".to_owned()),
                ..Goal::default()
            },
            ..OnboardingIntake::default()
        };
        let state = state_from_intake(intake);
        assert_eq!(state.goal.current_grade.as_deref(), Some("7A"));
        assert_eq!(
            state.performance["current_level"]["sport"]["worked"]["grade"],
            "7b"
        );
        assert!(state.performance["current_level"].get("boulder").is_some());
    }

    #[test]
    fn test_lead_default_grade_and_prefs() {
        let state = state_from_intake(OnboardingIntake::default());
        assert_eq!(state.goal.current_grade.as_deref(), Some("7a"));
        assert_eq!(state.planning_prefs.hard_day_cap_per_week, Some(3));
        assert_eq!(state.planning_prefs.target_training_days_per_week, Some(4));
        assert_eq!(state.user.timezone.as_deref(), Some("Europe/Brussels"));
    }
}
