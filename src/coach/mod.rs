// ABOUTME: Coach service, the synchronous boundary the HTTP collaborator and the CLI call into
// ABOUTME: Owns storage and the lazily loaded catalog; each method is one load-mutate-save transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Coach Service
//!
//! One method per route of the JSON surface. Mutating methods load the user
//! state, run the engines, and write the document back before returning, so
//! callers only need to serialize calls. The engines never see the filesystem.

mod feedback;
/// Request and response records
pub mod models;
mod onboarding;
mod planning;
mod replanning;

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use crux_core::dates::today;
use crux_core::errors::AppResult;
use crux_core::models::{Catalog, UserState};
use serde_json::Value;
use tracing::info;

use crate::catalog::load_catalog;
use crate::config::CoachConfig;
use crate::log_validation::{append_entry, AppendOutcome};
use crate::outdoor::{OutdoorLog, OutdoorStats};
use crate::storage::{SessionLog, StateStore};

pub use models::*;

/// File name of a log path, for responses
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Training coach bound to one data directory
pub struct Coach {
    config: CoachConfig,
    store: StateStore,
    session_log: SessionLog,
    outdoor_log: OutdoorLog,
    catalog: OnceLock<Catalog>,
}

impl Coach {
    /// Coach over the layout in `config`; the catalog is read on first use
    #[must_use]
    pub fn new(config: CoachConfig) -> Self {
        Self {
            store: StateStore::new(&config.state_path),
            session_log: SessionLog::from_config(&config),
            outdoor_log: OutdoorLog::new(&config.logs_dir),
            catalog: OnceLock::new(),
            config,
        }
    }

    /// Coach with an already loaded catalog
    #[must_use]
    pub fn with_catalog(config: CoachConfig, catalog: Catalog) -> Self {
        Self {
            catalog: OnceLock::from(catalog),
            ..Self::new(config)
        }
    }

    /// Runtime configuration
    #[must_use]
    pub const fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// User-state store
    #[must_use]
    pub const fn store(&self) -> &StateStore {
        &self.store
    }

    /// Session log
    #[must_use]
    pub const fn session_log(&self) -> &SessionLog {
        &self.session_log
    }

    /// Exercise, template, and session catalog
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be read on first use
    pub fn catalog(&self) -> AppResult<&Catalog> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }
        let loaded = load_catalog(&self.config.catalog_dir)?;
        Ok(self.catalog.get_or_init(|| loaded))
    }

    /// Exercise ids used recently, most recent first
    fn recent_exercise_ids(&self, today: NaiveDate) -> AppResult<Vec<String>> {
        self.session_log
            .recent_exercise_ids(today, self.config.history_days)
    }

    // ============================================================================================
    // State
    // ============================================================================================

    /// Current user state (`GET /state`)
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be read or decoded
    pub fn state(&self) -> AppResult<UserState> {
        self.store.load()
    }

    /// Deep-merge a partial document into the state (`PUT /state`)
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a non-object patch, or a storage error
    pub fn patch_state(&self, patch: &Value) -> AppResult<UserState> {
        self.store.patch(patch)
    }

    /// Replace the state with the empty template (`DELETE /state`)
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file cannot be written
    pub fn reset_state(&self) -> AppResult<StateResetResponse> {
        Ok(StateResetResponse {
            status: "reset".to_owned(),
            state: self.store.reset()?,
        })
    }

    // ============================================================================================
    // Catalog
    // ============================================================================================

    /// Every exercise (`GET /catalog/exercises`)
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be loaded
    pub fn list_exercises(&self) -> AppResult<ExerciseListResponse> {
        let exercises = self.catalog()?.exercises().to_vec();
        Ok(ExerciseListResponse {
            count: exercises.len(),
            exercises,
        })
    }

    /// Every session without its body (`GET /catalog/sessions`)
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be loaded
    pub fn list_sessions(&self) -> AppResult<SessionListResponse> {
        let sessions = self.catalog()?.session_summaries();
        Ok(SessionListResponse {
            count: sessions.len(),
            sessions,
        })
    }

    // ============================================================================================
    // Logs
    // ============================================================================================

    /// Validate and append a session log entry
    ///
    /// The outcome tells where the entry went; rejected and legacy entries are
    /// not errors.
    ///
    /// # Errors
    ///
    /// Returns an error when the state or a log file cannot be accessed
    pub fn append_session_log(&self, entry: Value) -> AppResult<AppendOutcome> {
        let bodyweight = self.store.load()?.bodyweight();
        append_entry(&self.session_log, entry, bodyweight, today())
    }

    /// Validate and append an outdoor session
    ///
    /// # Errors
    ///
    /// Returns a schema-rejected error listing every problem, or a storage error
    pub fn log_outdoor(&self, entry: &Value) -> AppResult<LogAppendResponse> {
        let path = self.outdoor_log.append(entry)?;
        Ok(LogAppendResponse {
            status: "ok".to_owned(),
            log_path: file_name(&path),
        })
    }

    /// Outdoor sessions on or after `since`
    ///
    /// # Errors
    ///
    /// Returns a storage error when a log file cannot be read
    pub fn outdoor_sessions(&self, since: Option<NaiveDate>) -> AppResult<OutdoorSessionsResponse> {
        let sessions = self.outdoor_log.load(since)?;
        Ok(OutdoorSessionsResponse {
            count: sessions.len(),
            sessions,
        })
    }

    /// Outdoor statistics on or after `since`
    ///
    /// # Errors
    ///
    /// Returns a storage error when a log file cannot be read
    pub fn outdoor_stats(&self, since: Option<NaiveDate>) -> AppResult<OutdoorStats> {
        let stats = self.outdoor_log.stats(since)?;
        info!(sessions = stats.total_sessions, routes = stats.total_routes, "outdoor stats computed");
        Ok(stats)
    }
}
