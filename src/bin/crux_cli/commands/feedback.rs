// ABOUTME: Closed-loop commands for crux-cli
// ABOUTME: Session feedback, day closing, and onboarding from request files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::Path;

use crux_coach::coach::{CloseDayRequest, Coach, FeedbackRequest, OnboardingIntake};
use crux_core::errors::AppResult;
use tracing::info;

use crate::helpers::display::print_json;
use crate::helpers::input::read_request;

type Result<T> = AppResult<T>;

/// Apply session feedback
pub fn feedback(coach: &Coach, file: &Path) -> Result<()> {
    let request: FeedbackRequest = read_request(file)?;
    print_json(&coach.apply_feedback(&request)?)
}

/// Close a resolved day
pub fn close_day(coach: &Coach, file: &Path) -> Result<()> {
    let request: CloseDayRequest = read_request(file)?;
    let response = coach.close_day(request)?;
    info!(log = %response.log_path, "day closed");
    print_json(&response)
}

/// Complete onboarding
pub fn onboard(coach: &Coach, file: &Path) -> Result<()> {
    let intake: OnboardingIntake = read_request(file)?;
    print_json(&coach.complete_onboarding(intake)?)
}
