// ABOUTME: Planning and adaptation engines for the Crux Coach training planner
// ABOUTME: Assessment, macrocycle, week planner, resolver, progression, replanner, closed loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

#![deny(unsafe_code)]

//! # Crux Intelligence
//!
//! Deterministic engines over the records in `crux-core`. Nothing in this
//! crate touches the filesystem or the clock except through explicit
//! arguments and the `generated_at` stamps, so identical inputs produce
//! identical plans.
//!
//! ## Engines
//!
//! - **assessment**: raw inputs to a six-axis profile
//! - **macrocycle**: ordered phases with durations, weights, and pools
//! - **planner**: seven-day plan inside one phase
//! - **resolver**: session blocks to concrete exercises
//! - **progression**: target injection and feedback application
//! - **adaptive**: feedback-driven recovery and downgrade actions
//! - **replanner**: events, overrides, quick-add, and reconciliation
//! - **`closed_loop`**: stimulus recency, fatigue counters, feedback log

/// Tunables with environment overrides
pub mod config;

/// Fixed domain tables: phases, pools, session metadata, benchmarks, intents
pub mod training_constants;

/// Six-axis assessment profile
pub mod assessment;

/// Macrocycle generation and phase helpers
pub mod macrocycle;

/// Week planner
pub mod planner;

/// Session resolver
pub mod resolver;

/// Progression engine
pub mod progression;

/// Adaptive replan detector
pub mod adaptive;

/// Replanner
pub mod replanner;

/// Closed-loop state updater
pub mod closed_loop;

pub use assessment::assess;
pub use closed_loop::{close_day, ClosedDay};
pub use config::{ConfigError, PlanningConfig};
pub use macrocycle::{generate_macrocycle, MacrocycleRequest};
pub use planner::{plan_week, PlanRequest};
pub use progression::{apply_feedback, inject_session_targets, inject_targets};
pub use replanner::{
    apply_day_add, apply_day_override, apply_events, regenerate_preserving_completed,
    suggest_sessions, DayAdd, DayOverride, ReplanContext,
};
pub use resolver::{consume_overrides, resolve_session, ResolveRequest};
