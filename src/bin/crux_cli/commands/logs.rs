// ABOUTME: Log commands for crux-cli
// ABOUTME: Session log append and validation with exit codes, outdoor logging and stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::Path;

use crux_coach::coach::Coach;
use crux_coach::log_validation::{validate_jsonl, AppendOutcome};
use crux_coach::outdoor::parse_since;
use crux_core::errors::AppResult;

use crate::helpers::display::{display_outdoor_stats, print_json};
use crate::helpers::input::read_value;

type Result<T> = AppResult<T>;

/// Validate and append one session log entry; the exit code tells where it went
pub fn append(coach: &Coach, file: &Path) -> Result<i32> {
    let entry = read_value(file)?;
    let outcome = coach.append_session_log(entry)?;
    match &outcome {
        AppendOutcome::Appended { path } => println!("OK: appended to {}", path.display()),
        AppendOutcome::Rejected { path, errors } => {
            eprintln!("INVALID: entry written to {}", path.display());
            for error in errors {
                eprintln!("  - {error}");
            }
        }
        AppendOutcome::Legacy { path, reason } => {
            eprintln!("LEGACY: {reason}; entry moved to {}", path.display());
        }
    }
    Ok(outcome.exit_code())
}

/// Check every line of a session log
pub fn validate(file: &Path) -> Result<i32> {
    let report = validate_jsonl(file)?;
    println!("{report}");
    Ok(report.exit_code())
}

/// Validate and append an outdoor session
pub fn outdoor_add(coach: &Coach, file: &Path) -> Result<()> {
    let entry = read_value(file)?;
    print_json(&coach.log_outdoor(&entry)?)
}

/// List outdoor sessions
pub fn outdoor_sessions(coach: &Coach, since: Option<&str>) -> Result<()> {
    print_json(&coach.outdoor_sessions(parse_since(since)?)?)
}

/// Outdoor statistics
pub fn outdoor_stats(coach: &Coach, since: Option<&str>, json: bool) -> Result<()> {
    let stats = coach.outdoor_stats(parse_since(since)?)?;
    if json {
        return print_json(&stats);
    }
    display_outdoor_stats(&stats);
    Ok(())
}
