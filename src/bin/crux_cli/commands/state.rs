// ABOUTME: State and catalog commands for crux-cli
// ABOUTME: Show, patch, and reset the user state; list exercises and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use std::path::Path;

use crux_coach::coach::Coach;
use crux_core::errors::AppResult;
use tracing::info;

use crate::helpers::display::print_json;
use crate::helpers::input::read_value;

type Result<T> = AppResult<T>;

/// Print the user state
pub fn show(coach: &Coach) -> Result<()> {
    print_json(&coach.state()?)
}

/// Deep-merge a partial document into the state
pub fn patch(coach: &Coach, file: &Path) -> Result<()> {
    let patch = read_value(file)?;
    let state = coach.patch_state(&patch)?;
    info!(file = %file.display(), "state patched");
    print_json(&state)
}

/// Replace the state with the empty template
pub fn reset(coach: &Coach) -> Result<()> {
    print_json(&coach.reset_state()?)
}

/// List catalog exercises
pub fn exercises(coach: &Coach) -> Result<()> {
    print_json(&coach.list_exercises()?)
}

/// List catalog sessions
pub fn sessions(coach: &Coach) -> Result<()> {
    print_json(&coach.list_sessions()?)
}
