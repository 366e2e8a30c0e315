// ABOUTME: Planning-domain error types for macrocycles, week plans, and replanning events
// ABOUTME: Provides structured errors that convert into the main AppError taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Planning Error Types
//!
//! Structured errors raised by the planning engines. Each variant knows which
//! [`ErrorCode`] it surfaces as, so the boundary can report 404 versus 422
//! without string matching.

use super::{AppError, ErrorCode};
use chrono::NaiveDate;
use serde_json::json;
use std::error::Error;
use std::fmt;

/// Errors specific to planning operations
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Grade string is not on the requested ladder
    UnknownGrade {
        /// The offending grade
        grade: String,
    },
    /// Macrocycle shorter than the minimum length
    TotalWeeksTooShort {
        /// Requested total weeks
        total_weeks: u32,
        /// Minimum accepted
        minimum: u32,
    },
    /// Replanner intent has no session mapping
    UnsupportedIntent {
        /// The offending intent
        intent: String,
    },
    /// The date is not one of the plan's days
    DateNotInPlan {
        /// Requested date
        date: NaiveDate,
    },
    /// No session matched the reference on that day
    SessionNotInDay {
        /// Day searched
        date: NaiveDate,
        /// Session id or `*`
        session_ref: String,
        /// Slot filter if any
        slot: Option<String>,
    },
    /// Quick-add target slot already holds a session
    SlotOccupied {
        /// Day requested
        date: NaiveDate,
        /// Slot requested
        slot: String,
    },
    /// Week number past the end of the macrocycle
    WeekOutOfRange {
        /// Requested week number
        week_num: u32,
        /// Weeks in the macrocycle
        total_weeks: u32,
    },
    /// A prerequisite record is absent from user state
    MissingPrecondition {
        /// Human-readable reason
        reason: String,
    },
    /// Session id not present in the catalog
    SessionNotFound {
        /// Requested session id
        session_id: String,
    },
    /// Feedback status outside `done|skipped`
    InvalidFeedbackStatus {
        /// The offending status
        status: String,
    },
    /// Catch-all for malformed engine input
    InvalidInput {
        /// Field at fault
        field: String,
        /// Reason the value is invalid
        reason: String,
    },
}

impl PlanningError {
    /// Create an "unknown grade" error
    #[must_use]
    pub fn unknown_grade(grade: impl Into<String>) -> Self {
        Self::UnknownGrade {
            grade: grade.into(),
        }
    }

    /// Create an "unsupported intent" error
    #[must_use]
    pub fn unsupported_intent(intent: impl Into<String>) -> Self {
        Self::UnsupportedIntent {
            intent: intent.into(),
        }
    }

    /// Create a "session not in day" error
    #[must_use]
    pub fn session_not_in_day(
        date: NaiveDate,
        session_ref: impl Into<String>,
        slot: Option<String>,
    ) -> Self {
        Self::SessionNotInDay {
            date,
            session_ref: session_ref.into(),
            slot,
        }
    }

    /// Create a "slot occupied" error
    #[must_use]
    pub fn slot_occupied(date: NaiveDate, slot: impl Into<String>) -> Self {
        Self::SlotOccupied {
            date,
            slot: slot.into(),
        }
    }

    /// Create a "missing precondition" error
    #[must_use]
    pub fn missing_precondition(reason: impl Into<String>) -> Self {
        Self::MissingPrecondition {
            reason: reason.into(),
        }
    }

    /// Create a "session not found" error
    #[must_use]
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an "invalid input" error
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Error code this variant surfaces as at the boundary
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownGrade { .. } => ErrorCode::UnknownGrade,
            Self::UnsupportedIntent { .. } => ErrorCode::UnsupportedIntent,
            Self::TotalWeeksTooShort { .. }
            | Self::InvalidFeedbackStatus { .. }
            | Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::DateNotInPlan { .. }
            | Self::SessionNotInDay { .. }
            | Self::SlotOccupied { .. } => ErrorCode::ConsistencyViolation,
            Self::WeekOutOfRange { .. } | Self::SessionNotFound { .. } => {
                ErrorCode::ResourceNotFound
            }
            Self::MissingPrecondition { .. } => ErrorCode::PreconditionFailed,
        }
    }
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGrade { grade } => write!(f, "Unknown grade: {grade}"),
            Self::TotalWeeksTooShort {
                total_weeks,
                minimum,
            } => write!(f, "total_weeks must be >= {minimum}, got {total_weeks}"),
            Self::UnsupportedIntent { intent } => {
                write!(f, "Unsupported override intent: {intent}")
            }
            Self::DateNotInPlan { date } => write!(f, "Date not present in plan: {date}"),
            Self::SessionNotInDay {
                date,
                session_ref,
                slot,
            } => write!(
                f,
                "Session not found for day={date} session_ref={session_ref} slot={}",
                slot.as_deref().unwrap_or("any")
            ),
            Self::SlotOccupied { date, slot } => {
                write!(f, "Slot '{slot}' already occupied on {date}")
            }
            Self::WeekOutOfRange {
                week_num,
                total_weeks,
            } => write!(
                f,
                "week_num {week_num} exceeds macrocycle total weeks ({total_weeks})"
            ),
            Self::MissingPrecondition { reason } => f.write_str(reason),
            Self::SessionNotFound { session_id } => {
                write!(f, "Session '{session_id}' not found in catalog")
            }
            Self::InvalidFeedbackStatus { status } => {
                write!(f, "status must be 'done' or 'skipped', got '{status}'")
            }
            Self::InvalidInput { field, reason } => write!(f, "Invalid {field}: {reason}"),
        }
    }
}

impl Error for PlanningError {}

impl From<PlanningError> for AppError {
    fn from(error: PlanningError) -> Self {
        let details = match &error {
            PlanningError::WeekOutOfRange {
                week_num,
                total_weeks,
            } => json!({ "week_num": week_num, "total_weeks": total_weeks }),
            PlanningError::SlotOccupied { date, slot } => {
                json!({ "date": date.to_string(), "slot": slot })
            }
            _ => json!({}),
        };
        Self::new(error.code(), error.to_string()).with_details(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_out_of_range_is_not_found() {
        let err: AppError = PlanningError::WeekOutOfRange {
            week_num: 14,
            total_weeks: 12,
        }
        .into();
        assert_eq!(err.http_status(), 404);
        assert!(err.message.contains("exceeds macrocycle total weeks (12)"));
    }

    #[test]
    fn test_slot_occupied_message() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let err = PlanningError::slot_occupied(date, "evening");
        assert_eq!(err.to_string(), "Slot 'evening' already occupied on 2026-03-03");
        assert_eq!(err.code(), ErrorCode::ConsistencyViolation);
    }
}
