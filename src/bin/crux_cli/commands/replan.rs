// ABOUTME: Replanning commands for crux-cli
// ABOUTME: Day overrides, event files, quick-adds, and suggestions against the stored week plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::Path;

use crux_coach::coach::{
    parse_wire, Coach, EventsRequest, OverrideRequest, QuickAddRequest, SuggestionsRequest,
};
use crux_core::dates::parse_date;
use crux_core::errors::AppResult;

use crate::helpers::display::{display_week_summary, print_json};
use crate::helpers::input::read_request;

type Result<T> = AppResult<T>;

/// Command-line arguments of an override
pub struct OverrideArgs {
    /// Training intent
    pub intent: String,
    /// Reference day
    pub reference: String,
    /// Day to change
    pub target: Option<String>,
    /// Location
    pub location: String,
    /// Slot
    pub slot: String,
    /// Gym id
    pub gym: Option<String>,
}

/// Train a different intent on a day
pub fn override_day(coach: &Coach, args: OverrideArgs) -> Result<()> {
    let request = OverrideRequest {
        intent: args.intent,
        location: parse_wire("location", &args.location)?,
        reference_date: parse_date(&args.reference)?,
        slot: parse_wire("slot", &args.slot)?,
        target_date: args.target.as_deref().map(parse_date).transpose()?,
        phase_id: None,
        gym_id: args.gym,
        week_plan: None,
    };
    let response = coach.override_day(request)?;
    display_week_summary(&response.week_plan);
    print_json(&response)
}

/// Apply an event file
pub fn events(coach: &Coach, file: &Path) -> Result<()> {
    let request: EventsRequest = read_request(file)?;
    let response = coach.apply_events(request)?;
    display_week_summary(&response.week_plan);
    print_json(&response)
}

/// Add a session to a free slot
pub fn quick_add(
    coach: &Coach,
    session_id: String,
    date: &str,
    slot: &str,
    location: &str,
    gym: Option<String>,
) -> Result<()> {
    let request = QuickAddRequest {
        session_id,
        target_date: parse_date(date)?,
        slot: parse_wire("slot", slot)?,
        location: parse_wire("location", location)?,
        phase_id: None,
        gym_id: gym,
        week_plan: None,
    };
    let response = coach.quick_add(request)?;
    for warning in &response.warnings {
        eprintln!("warning: {warning}");
    }
    print_json(&response)
}

/// Suggest sessions for a day
pub fn suggest(coach: &Coach, date: &str, location: &str, limit: usize) -> Result<()> {
    let request = SuggestionsRequest {
        date: parse_date(date)?,
        location: parse_wire("location", location)?,
        limit,
    };
    print_json(&coach.suggestions(&request)?)
}
