// ABOUTME: Main library entry point for the Crux climbing-training coach
// ABOUTME: Storage, catalog loading, log validation, and the coach service over the planning engines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

#![deny(unsafe_code)]

//! # Crux Coach
//!
//! Personal training planner for climbers. The pure engines live in
//! `crux-intelligence` and the typed records in `crux-core`; this crate owns
//! every file the system reads or writes and exposes the [`coach::Coach`]
//! service that an HTTP layer or the `crux-cli` binary calls.
//!
//! ## Data layout
//!
//! ```text
//! <data>/user_state.json
//! <data>/catalog/{exercises,templates,sessions}/v1/
//! <data>/logs/sessions_<year>.jsonl
//! <data>/logs/outdoor_sessions_<year>.jsonl
//! <data>/logs/session_logs_rejected.jsonl
//! <data>/logs/_bak/legacy_session_logs.jsonl
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use crux_coach::coach::Coach;
//! use crux_coach::config::CoachConfig;
//! use crux_core::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let coach = Coach::new(CoachConfig::from_env()?);
//!     let week = coach.week(0)?;
//!     println!("{} days planned", week.week_plan.days().len());
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the CLI binary (src/bin/) and integration tests (tests/).

/// Catalog loader for exercises, templates, and sessions
pub mod catalog;

/// Coach service, one method per route
pub mod coach;

/// Runtime paths and storage settings
pub mod config;

/// Session log validation, normalization, and quarantine
pub mod log_validation;

/// Structured logging setup
pub mod logging;

/// Outdoor session log and statistics
pub mod outdoor;

/// User-state document and JSONL log storage
pub mod storage;
