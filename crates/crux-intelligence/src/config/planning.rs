// ABOUTME: Planning engine configuration with environment overrides
// ABOUTME: Recency penalties, preference bonuses, freshness and dedupe windows, planner caps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Planning Configuration Module
//!
//! Tunables shared by the engines. Defaults reproduce the reference
//! behaviour; every value can be overridden through a `CRUX_` environment
//! variable and is validated before use.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

use super::error::ConfigError;

/// Global configuration singleton
static PLANNING_CONFIG: OnceLock<PlanningConfig> = OnceLock::new();

// ============================================================================
// Main Configuration
// ============================================================================

/// Planning configuration container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Week planner caps and windows
    pub planner: PlannerConfig,
    /// Resolver scoring
    pub resolver: ResolverConfig,
    /// Working loads and test queue
    pub progression: ProgressionConfig,
    /// Adaptive replan detector
    pub adaptive: AdaptiveConfig,
}

impl PlanningConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        PLANNING_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load planning config: {e}, using defaults");
                Self::default()
            })
        })
    }

    /// Load configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config = config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let planner = &self.planner;
        if planner.target_training_days == 0 || planner.target_training_days > 7 {
            return Err(ConfigError::ValueOutOfRange(
                "target_training_days must be between 1 and 7",
            ));
        }
        if planner.default_hard_cap > 7 {
            return Err(ConfigError::ValueOutOfRange("default_hard_cap must be <= 7"));
        }
        if planner.max_sessions_per_day == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "max_sessions_per_day must be > 0",
            ));
        }

        let resolver = &self.resolver;
        if resolver.recent_window == 0 || resolver.recent_window > resolver.mid_window {
            return Err(ConfigError::InvalidRange(
                "recency recent_window must be > 0 and <= mid_window",
            ));
        }
        if !(0.0..=1.0).contains(&resolver.cooldown_downshift_multiplier) {
            return Err(ConfigError::ValueOutOfRange(
                "cooldown_downshift_multiplier must be within 0.0..=1.0",
            ));
        }

        let progression = &self.progression;
        if progression.working_load_freshness_days <= 0 {
            return Err(ConfigError::ValueOutOfRange(
                "working_load_freshness_days must be > 0",
            ));
        }
        if progression.hard_retest_offset_days > progression.easy_retest_offset_days {
            return Err(ConfigError::InvalidRange(
                "hard_retest_offset_days must be <= easy_retest_offset_days",
            ));
        }
        if progression.streak_threshold == 0 {
            return Err(ConfigError::ValueOutOfRange("streak_threshold must be > 0"));
        }

        if self.adaptive.window_days < 0 {
            return Err(ConfigError::ValueOutOfRange("adaptive window_days must be >= 0"));
        }
        if self.adaptive.recovery_trigger_count < 2 {
            return Err(ConfigError::ValueOutOfRange(
                "adaptive recovery_trigger_count must be >= 2",
            ));
        }

        Ok(())
    }

    /// Helper function to parse and apply an environment variable override
    fn apply_env_var<T: FromStr>(env_var_name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Ok(val) = env::var(env_var_name) {
            *target = val
                .parse()
                .map_err(|_| ConfigError::Parse(format!("Invalid {env_var_name}")))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Planner
        Self::apply_env_var("CRUX_DEFAULT_HARD_CAP", &mut self.planner.default_hard_cap)?;
        Self::apply_env_var(
            "CRUX_TARGET_TRAINING_DAYS",
            &mut self.planner.target_training_days,
        )?;
        Self::apply_env_var(
            "CRUX_MAX_SESSIONS_PER_DAY",
            &mut self.planner.max_sessions_per_day,
        )?;
        Self::apply_env_var(
            "CRUX_PRETRIP_WINDOW_DAYS",
            &mut self.planner.pretrip_window_days,
        )?;

        // Resolver
        Self::apply_env_var("CRUX_RECENCY_RECENT_WINDOW", &mut self.resolver.recent_window)?;
        Self::apply_env_var("CRUX_RECENCY_MID_WINDOW", &mut self.resolver.mid_window)?;
        Self::apply_env_var("CRUX_PREFERRED_EDGE_MM", &mut self.resolver.preferred_edge_mm)?;
        Self::apply_env_var("CRUX_PREFERRED_GRIP", &mut self.resolver.preferred_grip)?;

        // Progression
        Self::apply_env_var(
            "CRUX_WORKING_LOAD_FRESHNESS_DAYS",
            &mut self.progression.working_load_freshness_days,
        )?;
        Self::apply_env_var(
            "CRUX_TEST_DEDUPE_DAYS",
            &mut self.progression.test_dedupe_days,
        )?;

        // Adaptive
        Self::apply_env_var("CRUX_ADAPTIVE_WINDOW_DAYS", &mut self.adaptive.window_days)?;

        Ok(self)
    }
}

// ============================================================================
// Planner
// ============================================================================

/// Week planner caps and windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Hard-day cap when the preferences name none
    pub default_hard_cap: u32,
    /// Training days aimed for when the preferences name none
    pub target_training_days: u32,
    /// Sessions allowed on a single day
    pub max_sessions_per_day: usize,
    /// Sessions kept on a deload week
    pub deload_max_sessions: usize,
    /// Days before a trip that count as pre-trip deload
    pub pretrip_window_days: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_hard_cap: 3,
            target_training_days: 4,
            max_sessions_per_day: 2,
            deload_max_sessions: 3,
            pretrip_window_days: 5,
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolver scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Most recent ids that take the heavy penalty
    pub recent_window: usize,
    /// Ids up to this position take the medium penalty
    pub mid_window: usize,
    /// Penalty inside the recent window
    pub recent_penalty: i64,
    /// Penalty inside the mid window
    pub mid_penalty: i64,
    /// Penalty for anything older
    pub old_penalty: i64,
    /// Edge depth that earns a bonus
    pub preferred_edge_mm: u32,
    /// Bonus for the preferred edge
    pub edge_bonus: i64,
    /// Grip that earns a bonus
    pub preferred_grip: String,
    /// Bonus for the preferred grip
    pub grip_bonus: i64,
    /// Load multiplier when a cooled-down cluster has to be used anyway
    pub cooldown_downshift_multiplier: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            recent_window: 5,
            mid_window: 15,
            recent_penalty: 100,
            mid_penalty: 25,
            old_penalty: 5,
            preferred_edge_mm: 20,
            edge_bonus: 10,
            preferred_grip: "half_crimp".to_owned(),
            grip_bonus: 5,
            cooldown_downshift_multiplier: 0.9,
        }
    }
}

// ============================================================================
// Progression
// ============================================================================

/// Working loads and test queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Working-load entries older than this are ignored
    pub working_load_freshness_days: i64,
    /// Same test enqueued within this many days is a duplicate
    pub test_dedupe_days: i64,
    /// Retest offset after a hard streak
    pub hard_retest_offset_days: i64,
    /// Retest offset after an easy streak
    pub easy_retest_offset_days: i64,
    /// Streak length that enqueues a retest
    pub streak_threshold: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            working_load_freshness_days: 60,
            test_dedupe_days: 21,
            hard_retest_offset_days: 7,
            easy_retest_offset_days: 14,
            streak_threshold: 2,
        }
    }
}

// ============================================================================
// Adaptive
// ============================================================================

/// Adaptive replan detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Feedback older than this many days is ignored
    pub window_days: i64,
    /// Very hard entries inside the window that insert a recovery day
    pub recovery_trigger_count: usize,
    /// Fatigue cost assumed for exercises without one
    pub default_fatigue_cost: u32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window_days: 3,
            recovery_trigger_count: 2,
            default_fatigue_cost: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_validate() {
        assert!(PlanningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_recency_windows() {
        let mut config = PlanningConfig::default();
        config.resolver.recent_window = 20;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    #[serial]
    fn test_env_override_and_parse_error() {
        env::set_var("CRUX_TEST_DEDUPE_DAYS", "14");
        let config = PlanningConfig::load().unwrap();
        assert_eq!(config.progression.test_dedupe_days, 14);

        env::set_var("CRUX_TEST_DEDUPE_DAYS", "two weeks");
        assert!(matches!(PlanningConfig::load(), Err(ConfigError::Parse(_))));
        env::remove_var("CRUX_TEST_DEDUPE_DAYS");
    }
}
