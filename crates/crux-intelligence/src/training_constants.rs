// ABOUTME: Fixed training tables: phase definitions, session pools, session metadata, benchmarks
// ABOUTME: Intent-to-session map and progression exercise sets, grouped by concern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Training Constants
//!
//! Domain tables the engines read but never modify. Tunables that a user
//! might reasonably change live in [`crate::config`]; these values define
//! the training model itself.

/// Phase definitions
pub mod phases {
    use crux_core::models::{Domain, DomainWeights, Intensity, PhaseId};

    /// Shortest accepted macrocycle
    pub const MIN_TOTAL_WEEKS: u32 = 9;

    /// Canonical macrocycle length the base durations add up to
    pub const CANONICAL_TOTAL_WEEKS: u32 = 12;

    /// Shortest non-deload phase
    pub const MIN_PHASE_WEEKS: u32 = 2;

    /// Format tag of generated macrocycles
    pub const MACROCYCLE_VERSION: &str = "macrocycle.v1";

    /// Duration of each phase in the canonical twelve-week plan
    #[must_use]
    pub const fn base_duration(phase: PhaseId) -> u32 {
        match phase {
            PhaseId::Base => 4,
            PhaseId::StrengthPower => 3,
            PhaseId::PowerEndurance | PhaseId::Performance => 2,
            PhaseId::Deload => 1,
        }
    }

    /// Display name
    #[must_use]
    pub const fn name(phase: PhaseId) -> &'static str {
        match phase {
            PhaseId::Base => "Endurance Base",
            PhaseId::StrengthPower => "Strength & Power",
            PhaseId::PowerEndurance => "Power Endurance",
            PhaseId::Performance => "Performance",
            PhaseId::Deload => "Deload",
        }
    }

    /// Dominant energy system
    #[must_use]
    pub const fn energy_system(phase: PhaseId) -> &'static str {
        match phase {
            PhaseId::Base => "aerobic",
            PhaseId::StrengthPower => "anaerobic_alactic",
            PhaseId::PowerEndurance => "anaerobic_lactic",
            PhaseId::Performance => "specific",
            PhaseId::Deload => "recovery",
        }
    }

    /// Highest session intensity the phase allows
    #[must_use]
    pub const fn intensity_cap(phase: PhaseId) -> Intensity {
        match phase {
            PhaseId::Base => Intensity::Medium,
            PhaseId::StrengthPower | PhaseId::Performance => Intensity::Max,
            PhaseId::PowerEndurance => Intensity::High,
            PhaseId::Deload => Intensity::Low,
        }
    }

    /// Coaching notes
    #[must_use]
    pub const fn notes(phase: PhaseId) -> &'static str {
        match phase {
            PhaseId::Base => {
                "Build aerobic base. High volume, low intensity. Focus technique and movement quality."
            }
            PhaseId::StrengthPower => {
                "Max strength development. Max hangs, limit bouldering, general strength. High quality, full rest."
            }
            PhaseId::PowerEndurance => {
                "Anaerobic capacity. 4x4, intervals, threshold climbing. Tolerate pump, push volume."
            }
            PhaseId::Performance => {
                "Peak performance. Limit climbing, projecting, outdoor. Reduce volume, maximize quality."
            }
            PhaseId::Deload => {
                "Recovery. Volume -50%. No max/high intensity. Mobility, prehab, easy climbing only."
            }
        }
    }

    /// Weight rows in `Domain` declaration order
    const fn weight_row(phase: PhaseId) -> [f64; 6] {
        match phase {
            PhaseId::Base => [0.20, 0.15, 0.15, 0.25, 0.20, 0.05],
            PhaseId::StrengthPower => [0.35, 0.25, 0.10, 0.10, 0.10, 0.10],
            PhaseId::PowerEndurance => [0.15, 0.10, 0.35, 0.15, 0.15, 0.10],
            PhaseId::Performance => [0.10, 0.05, 0.20, 0.25, 0.25, 0.15],
            PhaseId::Deload => [0.05, 0.05, 0.05, 0.10, 0.05, 0.10],
        }
    }

    /// Every domain in declaration order
    pub const DOMAINS: [Domain; 6] = [
        Domain::FingerStrength,
        Domain::PullingStrength,
        Domain::PowerEndurance,
        Domain::VolumeClimbing,
        Domain::Technique,
        Domain::CorePrehab,
    ];

    /// Unadjusted domain weights of a phase
    #[must_use]
    pub fn base_weights(phase: PhaseId) -> DomainWeights {
        DOMAINS.into_iter().zip(weight_row(phase)).collect()
    }

    /// Sessions the phase is built around
    #[must_use]
    pub const fn primary_sessions(phase: PhaseId) -> &'static [&'static str] {
        match phase {
            PhaseId::Base => &[
                "endurance_aerobic_gym",
                "technique_focus_gym",
                "finger_maintenance_home",
                "finger_strength_home",
                "prehab_maintenance",
            ],
            PhaseId::StrengthPower => &[
                "power_contact_gym",
                "strength_long",
                "finger_strength_home",
                "prehab_maintenance",
            ],
            PhaseId::PowerEndurance => &["power_endurance_gym", "prehab_maintenance"],
            PhaseId::Performance => &["technique_focus_gym", "prehab_maintenance"],
            PhaseId::Deload => &[
                "regeneration_easy",
                "flexibility_full",
                "yoga_recovery",
                "prehab_maintenance",
            ],
        }
    }

    /// Sessions the phase may also use
    #[must_use]
    pub const fn available_sessions(phase: PhaseId) -> &'static [&'static str] {
        match phase {
            PhaseId::Base => &[
                "flexibility_full",
                "handstand_practice",
                "complementary_conditioning",
                "strength_long",
                "power_endurance_gym",
            ],
            PhaseId::StrengthPower => &[
                "technique_focus_gym",
                "flexibility_full",
                "handstand_practice",
                "complementary_conditioning",
            ],
            PhaseId::PowerEndurance => &[
                "technique_focus_gym",
                "finger_strength_home",
                "flexibility_full",
                "handstand_practice",
                "endurance_aerobic_gym",
            ],
            PhaseId::Performance => &[
                "power_endurance_gym",
                "power_contact_gym",
                "finger_strength_home",
                "flexibility_full",
                "handstand_practice",
            ],
            PhaseId::Deload => &["handstand_practice"],
        }
    }
}

/// Session metadata used by the planner and replanner
pub mod sessions {
    use crux_core::models::{Intensity, Location, SessionTags};

    /// Recovery session used for fills, skips, and downshifts
    pub const REGENERATION: &str = "regeneration_easy";
    /// Medium session used for downgrades and accessory fills
    pub const COMPLEMENTARY: &str = "complementary_conditioning";
    /// Finger session injected in power-endurance weeks and for compensation
    pub const FINGER_MAINTENANCE: &str = "finger_maintenance_home";

    /// Benchmark sessions placed on the last week of base and strength phases
    pub const TEST_SESSIONS: [&str; 3] = [
        "test_max_hang_5s",
        "test_repeater_7_3",
        "test_max_weighted_pullup",
    ];

    /// Sessions a lost finger stimulus may replace
    pub const FINGER_COMPENSATION_REPLACEABLE: [&str; 5] = [
        "complementary_conditioning",
        "regeneration_easy",
        "yoga_recovery",
        "flexibility_full",
        "prehab_maintenance",
    ];

    /// Immutable per-session planning metadata
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SessionMeta {
        /// Counts against the hard-day cap
        pub hard: bool,
        /// Loads the fingers
        pub finger: bool,
        /// Intensity
        pub intensity: Intensity,
        /// Primary climbing session (placed in pass 1)
        pub climbing: bool,
        /// Locations the session can run at
        pub locations: &'static [Location],
    }

    impl SessionMeta {
        /// Constraint tags for a planned session
        #[must_use]
        pub const fn tags(&self) -> SessionTags {
            SessionTags {
                hard: self.hard,
                finger: self.finger,
            }
        }

        /// Whether the session can run at `location`
        #[must_use]
        pub fn allows(&self, location: Location) -> bool {
            self.locations.contains(&location)
        }
    }

    const GYM: &[Location] = &[Location::Gym];
    const HOME: &[Location] = &[Location::Home];
    const GYM_HOME: &[Location] = &[Location::Gym, Location::Home];
    const ANYWHERE: &[Location] = &[Location::Gym, Location::Home, Location::Outdoor];

    const fn meta(
        hard: bool,
        finger: bool,
        intensity: Intensity,
        climbing: bool,
        locations: &'static [Location],
    ) -> SessionMeta {
        SessionMeta {
            hard,
            finger,
            intensity,
            climbing,
            locations,
        }
    }

    /// Metadata assumed for sessions the table does not know
    pub const UNKNOWN: SessionMeta = meta(false, false, Intensity::Low, false, GYM_HOME);

    /// Metadata of a known session
    #[must_use]
    pub fn lookup(session_id: &str) -> Option<SessionMeta> {
        let found = match session_id {
            "strength_long" => meta(true, true, Intensity::Max, true, GYM_HOME),
            "power_contact_gym" => meta(true, false, Intensity::Max, true, GYM),
            "power_endurance_gym" => meta(true, false, Intensity::High, true, GYM),
            "endurance_aerobic_gym" | "technique_focus_gym" => {
                meta(false, false, Intensity::Medium, true, GYM)
            }
            "finger_strength_home" => meta(true, true, Intensity::Max, true, HOME),
            "prehab_maintenance" | "flexibility_full" => {
                meta(false, false, Intensity::Low, false, GYM_HOME)
            }
            "yoga_recovery" => meta(false, false, Intensity::Low, false, HOME),
            "handstand_practice" | "complementary_conditioning" => {
                meta(false, false, Intensity::Medium, false, GYM_HOME)
            }
            "regeneration_easy" => meta(false, false, Intensity::Low, false, ANYWHERE),
            "finger_maintenance_home" => meta(false, true, Intensity::Medium, true, HOME),
            "test_max_hang_5s" | "test_repeater_7_3" => {
                meta(true, true, Intensity::High, false, GYM_HOME)
            }
            "test_max_weighted_pullup" => meta(true, false, Intensity::High, false, GYM_HOME),
            _ => return None,
        };
        Some(found)
    }

    /// Metadata of any session, defaulting to [`UNKNOWN`]
    #[must_use]
    pub fn lookup_or_default(session_id: &str) -> SessionMeta {
        lookup(session_id).unwrap_or(UNKNOWN)
    }
}

/// Strength benchmarks, total load over bodyweight, by target sport grade
pub mod benchmarks {
    /// Sport index of `7a`, the first row of the tables
    pub const FIRST_SPORT_INDEX: usize = 9;

    /// Max hang 20 mm 5 s ratios for 7a..9a+
    pub const FINGER: [f64; 14] = [
        1.00, 1.08, 1.15, 1.20, 1.25, 1.30, 1.40, 1.50, 1.60, 1.70, 1.80, 1.90, 2.00, 2.10,
    ];

    /// Weighted pull-up 1RM ratios for 7a..9a+
    pub const PULLING: [f64; 14] = [
        1.20, 1.25, 1.30, 1.35, 1.40, 1.45, 1.55, 1.65, 1.75, 1.85, 1.95, 2.05, 2.15, 2.25,
    ];

    /// Nearest table entry for a sport grade index
    #[must_use]
    pub fn ratio(table: &[f64; 14], sport_index: usize) -> f64 {
        let row = sport_index
            .saturating_sub(FIRST_SPORT_INDEX)
            .min(table.len() - 1);
        table[row]
    }
}

/// Day-override intents
pub mod intents {
    /// Intent to session mapping
    pub const INTENT_TO_SESSION: [(&str, &str); 13] = [
        ("rest", "regeneration_easy"),
        ("recovery", "yoga_recovery"),
        ("technique", "technique_focus_gym"),
        ("strength", "strength_long"),
        ("power", "power_contact_gym"),
        ("projecting", "power_contact_gym"),
        ("power_endurance", "power_endurance_gym"),
        ("aerobic_endurance", "endurance_aerobic_gym"),
        ("core", "complementary_conditioning"),
        ("prehab", "prehab_maintenance"),
        ("flexibility", "flexibility_full"),
        ("finger_maintenance", "finger_maintenance_home"),
        ("finger_max", "finger_strength_home"),
    ];

    /// Session mapped to an intent
    #[must_use]
    pub fn session_for(intent: &str) -> Option<&'static str> {
        let wanted = intent.trim().to_lowercase();
        INTENT_TO_SESSION
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, session)| *session)
    }
}

/// Progression exercise sets and reasons
pub mod progression {
    /// Hangboard max-strength exercise
    pub const MAX_HANG: &str = "max_hang_5s";
    /// Limit bouldering exercise
    pub const LIMIT_BOULDERING: &str = "limit_bouldering";
    /// Exercises progressed by load
    pub const LOAD_BASED: [&str; 3] = ["max_hang_5s", "weighted_pullup", "pullup"];
    /// Exercises progressed by grade
    pub const GRADE_BASED: [&str; 1] = ["limit_bouldering"];
    /// Boulder surfaces in priority order
    pub const SURFACE_PRIORITY: [&str; 3] = ["board_kilter", "spraywall", "gym_boulder"];
    /// Surface used when the gym lists none
    pub const DEFAULT_SURFACE: &str = "gym_boulder";
    /// Font grade used when the user has no benchmark
    pub const DEFAULT_BENCHMARK_GRADE: &str = "6C";
    /// Test id enqueued by streak detection
    pub const MAX_HANG_TEST_ID: &str = "max_hang_5s_total_load";
    /// Reason for a retest after a hard streak
    pub const HARD_STREAK_REASON: &str = "two_recent_hard_feedback_on_max_hang_5s";
    /// Reason for a retest after an easy streak
    pub const EASY_STREAK_REASON: &str = "two_recent_easy_feedback_on_max_hang_5s";
    /// Default intensity for max hangs without a prescription
    pub const DEFAULT_MAX_HANG_INTENSITY: f64 = 0.9;
    /// Days after which a promoted test is considered stale
    pub const TEST_STALE_AFTER_DAYS: u32 = 90;

    /// Whether the exercise is progressed by load
    #[must_use]
    pub fn is_load_based(exercise_id: &str) -> bool {
        LOAD_BASED.contains(&exercise_id)
    }

    /// Whether the exercise is progressed by grade
    #[must_use]
    pub fn is_grade_based(exercise_id: &str) -> bool {
        GRADE_BASED.contains(&exercise_id)
    }
}

/// Equipment vocabulary
pub mod equipment {
    /// Always available, everywhere
    pub const FLOOR: &str = "floor";
    /// Generic token implied by any weight subtype
    pub const WEIGHT: &str = "weight";
    /// Tokens that imply [`WEIGHT`]
    pub const WEIGHT_SUBTYPES: [&str; 3] = ["dumbbell", "kettlebell", "barbell"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crux_core::models::{Intensity, PhaseId};

    #[test]
    fn test_base_weights_sum_to_one() {
        for phase in PhaseId::ALL {
            if phase == PhaseId::Deload {
                continue;
            }
            let sum: f64 = phases::base_weights(phase).values().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{phase} sums to {sum}");
        }
    }

    #[test]
    fn test_base_durations_cover_canonical_weeks() {
        let total: u32 = PhaseId::ALL.iter().map(|p| phases::base_duration(*p)).sum();
        assert_eq!(total, phases::CANONICAL_TOTAL_WEEKS);
    }

    #[test]
    fn test_session_lookup() {
        let strength = sessions::lookup("strength_long").unwrap();
        assert!(strength.hard && strength.finger);
        assert_eq!(strength.intensity, Intensity::Max);
        assert!(sessions::lookup("nonexistent").is_none());
        assert_eq!(sessions::lookup_or_default("nonexistent"), sessions::UNKNOWN);
    }

    #[test]
    fn test_benchmark_nearest_entry() {
        assert!((benchmarks::ratio(&benchmarks::FINGER, 0) - 1.0).abs() < f64::EPSILON);
        assert!((benchmarks::ratio(&benchmarks::FINGER, 14) - 1.30).abs() < f64::EPSILON);
        assert!((benchmarks::ratio(&benchmarks::PULLING, 40) - 2.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_intent_lookup_is_case_insensitive() {
        assert_eq!(intents::session_for(" Strength "), Some("strength_long"));
        assert_eq!(intents::session_for("nap"), None);
    }
}
