// ABOUTME: Re-exports command modules for crux-cli
// ABOUTME: Provides state, planning, replanning, feedback, and log commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

pub mod feedback;
pub mod logs;
pub mod planning;
pub mod replan;
pub mod state;
