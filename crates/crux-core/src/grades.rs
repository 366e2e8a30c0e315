// ABOUTME: Sport and Font grade ladders stored as ordinal indices with a canonical formatter
// ABOUTME: Provides parsing, half-grade gaps, clamped stepping, and Font-to-sport equivalence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Grade arithmetic.
//!
//! Grades are never compared as strings. A [`Grade`] is a `(scale, index)`
//! pair; one index step is one half-grade on its ladder.

use crate::errors::PlanningError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// French sport ladder, easiest first
pub const SPORT_GRADES: [&str; 23] = [
    "5a", "5b", "5c", "6a", "6a+", "6b", "6b+", "6c", "6c+", "7a", "7a+", "7b", "7b+", "7c", "7c+",
    "8a", "8a+", "8b", "8b+", "8c", "8c+", "9a", "9a+",
];

/// Fontainebleau boulder ladder, easiest first
pub const FONT_GRADES: [&str; 24] = [
    "5A", "5A+", "5B", "5B+", "5C", "5C+", "6A", "6A+", "6B", "6B+", "6C", "6C+", "7A", "7A+",
    "7B", "7B+", "7C", "7C+", "8A", "8A+", "8B", "8B+", "8C", "8C+",
];

/// Sport index for each Font grade below 6A (5A..5C+)
const FONT_LOW_TO_SPORT: [usize; 6] = [0, 0, 1, 1, 2, 3];

/// Index of Font 6A, from which the ladders run one step apart
const FONT_6A_INDEX: usize = 6;

/// Which ladder a grade belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeScale {
    /// French sport grades (`7a+`)
    Sport,
    /// Fontainebleau boulder grades (`7A+`)
    Font,
}

impl GradeScale {
    const fn ladder(self) -> &'static [&'static str] {
        match self {
            Self::Sport => &SPORT_GRADES,
            Self::Font => &FONT_GRADES,
        }
    }
}

/// A grade on one of the two ladders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grade {
    scale: GradeScale,
    index: usize,
}

impl Grade {
    /// Parse a grade on a specific ladder
    ///
    /// # Errors
    ///
    /// Returns `PlanningError::UnknownGrade` if the label is not on the ladder
    pub fn parse_on(scale: GradeScale, raw: &str) -> Result<Self, PlanningError> {
        let cleaned: String = raw.split_whitespace().collect();
        let cleaned = match scale {
            GradeScale::Sport => cleaned.to_lowercase(),
            GradeScale::Font => cleaned.to_uppercase(),
        };
        scale
            .ladder()
            .iter()
            .position(|g| *g == cleaned)
            .map(|index| Self { scale, index })
            .ok_or_else(|| PlanningError::unknown_grade(raw))
    }

    /// Parse a grade, detecting the ladder from letter case (`7a` sport, `7A` Font)
    ///
    /// # Errors
    ///
    /// Returns `PlanningError::UnknownGrade` if the label is on neither ladder
    pub fn parse(raw: &str) -> Result<Self, PlanningError> {
        let trimmed = raw.trim();
        if trimmed.chars().any(|c| c.is_ascii_uppercase()) {
            Self::parse_on(GradeScale::Font, trimmed)
        } else {
            Self::parse_on(GradeScale::Sport, trimmed)
        }
    }

    /// Ladder this grade belongs to
    #[must_use]
    pub const fn scale(self) -> GradeScale {
        self.scale
    }

    /// Ordinal position on its ladder
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Canonical label
    #[must_use]
    pub fn label(self) -> &'static str {
        self.scale.ladder()[self.index]
    }

    /// Move by `steps` half-grades, clamped to the ladder ends
    #[must_use]
    pub fn step(self, steps: i32) -> Self {
        let last = self.scale.ladder().len() as i64 - 1;
        let index = (self.index as i64 + i64::from(steps)).clamp(0, last);
        Self {
            scale: self.scale,
            index: index as usize,
        }
    }

    /// Equivalent grade on the sport ladder (identity for sport grades)
    #[must_use]
    pub fn to_sport_equivalent(self) -> Self {
        match self.scale {
            GradeScale::Sport => self,
            GradeScale::Font => {
                let index = if self.index < FONT_6A_INDEX {
                    FONT_LOW_TO_SPORT[self.index]
                } else {
                    self.index - 1
                };
                Self {
                    scale: GradeScale::Sport,
                    index: index.min(SPORT_GRADES.len() - 1),
                }
            }
        }
    }

    /// Signed half-grade distance `self - other`, comparing on the sport ladder
    /// when the scales differ
    #[must_use]
    pub fn gap(self, other: Self) -> i64 {
        if self.scale == other.scale {
            self.index as i64 - other.index as i64
        } else {
            let a = self.to_sport_equivalent();
            let b = other.to_sport_equivalent();
            a.index as i64 - b.index as i64
        }
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.scale == other.scale).then(|| self.index.cmp(&other.index))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Index of a grade on its own ladder
///
/// # Errors
///
/// Returns `PlanningError::UnknownGrade` for unknown labels
pub fn grade_index(raw: &str) -> Result<usize, PlanningError> {
    Grade::parse(raw).map(Grade::index)
}

/// `index(a) - index(b)` in half-grades
///
/// # Errors
///
/// Returns `PlanningError::UnknownGrade` if either label is unknown
pub fn grade_gap(a: &str, b: &str) -> Result<i64, PlanningError> {
    Ok(Grade::parse(a)?.gap(Grade::parse(b)?))
}

/// Step a Font grade by `steps`, falling back to `fallback` when the input
/// is not a Font grade
#[must_use]
pub fn step_font_grade(raw: &str, steps: i32, fallback: Grade) -> Grade {
    Grade::parse_on(GradeScale::Font, raw)
        .unwrap_or(fallback)
        .step(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detects_scale() {
        assert_eq!(Grade::parse("7c+").unwrap().scale(), GradeScale::Sport);
        assert_eq!(Grade::parse("7C+").unwrap().scale(), GradeScale::Font);
        assert_eq!(Grade::parse(" 6a+ ").unwrap().label(), "6a+");
        assert!(Grade::parse("10z").is_err());
    }

    #[test]
    fn test_gap_in_half_grades() {
        assert_eq!(grade_gap("7c+", "7b").unwrap(), 3);
        assert_eq!(grade_gap("7a", "7a").unwrap(), 0);
        assert_eq!(grade_gap("6a", "7a").unwrap(), -6);
    }

    #[test]
    fn test_step_is_clamped() {
        let top = Grade::parse("8C+").unwrap();
        assert_eq!(top.step(2).label(), "8C+");
        let bottom = Grade::parse("5a").unwrap();
        assert_eq!(bottom.step(-3).label(), "5a");
        assert_eq!(Grade::parse("6C").unwrap().step(-2).label(), "6B");
    }

    #[test]
    fn test_font_to_sport_equivalence() {
        assert_eq!(Grade::parse("6A").unwrap().to_sport_equivalent().label(), "6b");
        assert_eq!(Grade::parse("7A").unwrap().to_sport_equivalent().label(), "7b");
        assert_eq!(Grade::parse("5C+").unwrap().to_sport_equivalent().label(), "6a");
        assert_eq!(Grade::parse("8C+").unwrap().to_sport_equivalent().label(), "9a+");
    }

    #[test]
    fn test_serde_uses_canonical_label() {
        let grade: Grade = serde_json::from_str("\"7B+\"").unwrap();
        assert_eq!(serde_json::to_string(&grade).unwrap(), "\"7B+\"");
    }
}
