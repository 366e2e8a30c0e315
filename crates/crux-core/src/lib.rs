// ABOUTME: Core types for the Crux Coach climbing training planner
// ABOUTME: Foundation crate with error handling, the grade ladder, and typed planning records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

#![deny(unsafe_code)]

//! # Crux Core
//!
//! Foundation crate providing shared types for the Crux Coach planner. The
//! engines in `crux-intelligence` and the storage layer in the root crate
//! both speak in these records, so this crate is designed to change rarely.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `PlanningError`
//! - **grades**: Sport and Font grade ladders with ordinal arithmetic
//! - **models**: User state, macrocycle, week plan, catalog, and log records

/// Unified error handling system with standard error codes
pub mod errors;

/// Sport and boulder grade ladders stored as ordinal indices
pub mod grades;

/// Core data models (user state, plans, catalog, logs)
pub mod models;

/// Calendar helpers shared by the engines and the storage layer
pub mod dates;
