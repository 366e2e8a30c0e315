// ABOUTME: Configuration module for crux-intelligence crate
// ABOUTME: Re-exports planning configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

/// Configuration error types
pub mod error;

/// Planning engine tunables (recency, windows, caps)
pub mod planning;

pub use error::ConfigError;
pub use planning::{
    AdaptiveConfig, PlannerConfig, PlanningConfig, ProgressionConfig, ResolverConfig,
};
