// ABOUTME: Shared vocabulary for plans and catalog records: slots, weekdays, locations, intensities
// ABOUTME: Phase ids, training domains, feedback labels, and session tags used across every engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Time-of-day slot; declaration order is the canonical day order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Before work
    Morning,
    /// Midday break
    Lunch,
    /// After work
    Evening,
}

impl Slot {
    /// All slots in canonical order
    pub const ALL: [Self; 3] = [Self::Morning, Self::Lunch, Self::Evening];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Lunch => "lunch",
            Self::Evening => "evening",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week, Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    /// Monday
    Mon,
    /// Tuesday
    Tue,
    /// Wednesday
    Wed,
    /// Thursday
    Thu,
    /// Friday
    Fri,
    /// Saturday
    Sat,
    /// Sunday
    Sun,
}

impl Weekday {
    /// All weekdays, Monday first
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// Weekday of a calendar date
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_monday() as usize]
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session takes place; declaration order is alphabetical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Climbing gym
    Gym,
    /// Home setup
    Home,
    /// Crag or boulder field
    Outdoor,
}

impl Location {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gym => "gym",
            Self::Home => "home",
            Self::Outdoor => "outdoor",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session intensity, totally ordered `low < medium < high < max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Recovery and mobility
    Low,
    /// Volume and technique
    Medium,
    /// Anaerobic work
    High,
    /// Maximal strength and power
    Max,
}

impl Intensity {
    /// Fallback load score for a session not yet resolved to exercises
    #[must_use]
    pub const fn load_score(self) -> u32 {
        match self {
            Self::Low => 20,
            Self::Medium => 40,
            Self::High => 65,
            Self::Max => 85,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Macrocycle phase; declaration order is the canonical phase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    /// Aerobic base and movement quality
    Base,
    /// Maximal strength and power
    StrengthPower,
    /// Anaerobic capacity
    PowerEndurance,
    /// Peak and project
    Performance,
    /// Recovery week
    Deload,
}

impl PhaseId {
    /// All phases in canonical order
    pub const ALL: [Self; 5] = [
        Self::Base,
        Self::StrengthPower,
        Self::PowerEndurance,
        Self::Performance,
        Self::Deload,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::StrengthPower => "strength_power",
            Self::PowerEndurance => "power_endurance",
            Self::Performance => "performance",
            Self::Deload => "deload",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training domain a phase distributes weight over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Max hangs and finger loading
    FingerStrength,
    /// Weighted pulls and lock-offs
    PullingStrength,
    /// Lactic intervals and 4x4s
    PowerEndurance,
    /// Mileage on easy terrain
    VolumeClimbing,
    /// Movement skill
    Technique,
    /// Core, antagonists, and injury prevention
    CorePrehab,
}

/// Domain weight vector; values are non-negative and sum to 1.0
pub type DomainWeights = BTreeMap<Domain, f64>;

/// Canonical per-exercise feedback label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    /// Far below capacity
    #[serde(alias = "too_easy")]
    VeryEasy,
    /// Below capacity
    Easy,
    /// On target
    Ok,
    /// Above target
    Hard,
    /// Failed or nearly failed
    #[serde(alias = "too_hard", alias = "fail")]
    VeryHard,
}

impl FeedbackLabel {
    /// Map a raw label or a legacy difficulty alias to the canonical label
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "very_easy" | "too_easy" => Some(Self::VeryEasy),
            "easy" => Some(Self::Easy),
            "ok" => Some(Self::Ok),
            "hard" => Some(Self::Hard),
            "very_hard" | "too_hard" | "fail" => Some(Self::VeryHard),
            _ => None,
        }
    }

    /// Difficulty score from 1 (very easy) to 5 (very hard)
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::VeryEasy => 1,
            Self::Easy => 2,
            Self::Ok => 3,
            Self::Hard => 4,
            Self::VeryHard => 5,
        }
    }

    /// Bucket a mean difficulty score at thresholds 1.5 / 2.5 / 3.5 / 4.5
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 1.5 {
            Self::VeryEasy
        } else if score <= 2.5 {
            Self::Easy
        } else if score <= 3.5 {
            Self::Ok
        } else if score <= 4.5 {
            Self::Hard
        } else {
            Self::VeryHard
        }
    }

    /// Signed half-grade step applied to a boulder target after this feedback
    #[must_use]
    pub const fn grade_delta(self) -> i32 {
        match self {
            Self::VeryEasy => 2,
            Self::Easy => 1,
            Self::Ok => 0,
            Self::Hard => -1,
            Self::VeryHard => -2,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryEasy => "very_easy",
            Self::Easy => "easy",
            Self::Ok => "ok",
            Self::Hard => "hard",
            Self::VeryHard => "very_hard",
        }
    }
}

impl fmt::Display for FeedbackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion status reported for a session or a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Trained as planned
    Done,
    /// Did not train
    Skipped,
}

impl SessionStatus {
    /// Parse `done` or `skipped`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "done" => Some(Self::Done),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }
}

/// Constraint tags carried by every planned session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTags {
    /// Counts against the weekly hard-day cap
    #[serde(default)]
    pub hard: bool,
    /// Loads the fingers; needs a 48 h gap from other finger days
    #[serde(default)]
    pub finger: bool,
}
