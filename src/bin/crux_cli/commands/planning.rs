// ABOUTME: Planning commands for crux-cli
// ABOUTME: Assessment, macrocycle generation, week planning, and session resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::Path;

use crux_coach::coach::{
    parse_wire, AssessmentRequest, Coach, MacrocycleGenerateRequest, ResolveSessionRequest,
    SessionContext,
};
use crux_core::dates::parse_date;
use crux_core::errors::AppResult;

use crate::helpers::display::{display_week_summary, print_json};
use crate::helpers::input::read_request;

type Result<T> = AppResult<T>;

/// Compute the assessment profile from a request file or the stored state
pub fn assess(coach: &Coach, file: Option<&Path>) -> Result<()> {
    let request = match file {
        Some(path) => read_request::<AssessmentRequest>(path)?,
        None => AssessmentRequest::default(),
    };
    print_json(&coach.compute_assessment(request)?)
}

/// Generate a macrocycle
pub fn generate_macrocycle(coach: &Coach, start: Option<&str>, weeks: u32) -> Result<()> {
    let request = MacrocycleGenerateRequest {
        start_date: start.map(parse_date).transpose()?,
        total_weeks: weeks,
    };
    print_json(&coach.generate_macrocycle(&request)?)
}

/// Plan a week with sessions resolved inline
pub fn week(coach: &Coach, week_num: u32, summary: bool) -> Result<()> {
    let response = coach.week(week_num)?;
    display_week_summary(&response.week_plan);
    if summary {
        return Ok(());
    }
    print_json(&response)
}

/// Resolve one session
pub fn resolve(
    coach: &Coach,
    session_id: String,
    location: Option<&str>,
    gym: Option<String>,
    date: Option<&str>,
) -> Result<()> {
    let context = SessionContext {
        location: location
            .map(|raw| parse_wire("location", raw))
            .transpose()?,
        gym_id: gym,
        target_date: date.map(parse_date).transpose()?,
    };
    let request = ResolveSessionRequest {
        session_id,
        context: Some(context),
    };
    print_json(&coach.resolve(&request)?)
}
