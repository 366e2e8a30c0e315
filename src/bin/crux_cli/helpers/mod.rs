// ABOUTME: Re-exports helper modules for crux-cli
// ABOUTME: Provides JSON file input and terminal output utilities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

pub mod display;
pub mod input;
