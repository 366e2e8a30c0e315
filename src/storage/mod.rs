// ABOUTME: Persistence layer for the user-state document and the append-only session logs
// ABOUTME: Everything is plain files under the configured data directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

/// Append-only JSON Lines helpers
pub mod jsonl;
/// Per-year session logs with rejected and legacy quarantine
pub mod session_log;
/// User-state document store
pub mod state_store;

pub use session_log::SessionLog;
pub use state_store::StateStore;
