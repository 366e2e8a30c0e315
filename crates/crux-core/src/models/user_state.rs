// ABOUTME: The single mutable user-state document (schema 1.5) as typed subtrees
// ABOUTME: Working loads, test queue, recency, fatigue counters, overrides, cooldowns, and preferences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::assessment::{AssessmentInputs, BodyMetrics, Goal};
use super::availability::AvailabilityInput;
use super::catalog::string_list;
use super::common::FeedbackLabel;
use super::macrocycle::{Macrocycle, Trip};
use super::plan::WeekPlan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Schema version written into fresh user state
pub const USER_STATE_SCHEMA_VERSION: &str = "1.5";

/// Maximum number of entries kept in the feedback log
pub const FEEDBACK_LOG_CAPACITY: usize = 7;

/// Identity block of the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name used in messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<String>,
    /// IANA timezone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A gym the user trains at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gym {
    /// Gym id
    #[serde(default)]
    pub gym_id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lower is preferred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Equipment tokens, lowercased
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub equipment: Vec<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Gym {
    /// Sort key used whenever a gym has to be picked deterministically
    #[must_use]
    pub fn sort_key(&self) -> (u32, &str) {
        (self.priority.unwrap_or(u32::MAX), self.gym_id.as_str())
    }

    /// Whether the gym carries the equipment token
    #[must_use]
    pub fn has(&self, token: &str) -> bool {
        self.equipment.iter().any(|e| e == token)
    }
}

/// Equipment at home and at each gym
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Home equipment tokens
    #[serde(default, deserialize_with = "string_list::deserialize")]
    pub home: Vec<String>,
    /// Gyms
    #[serde(default)]
    pub gyms: Vec<Gym>,
}

impl Equipment {
    /// Gym by id
    #[must_use]
    pub fn gym(&self, gym_id: &str) -> Option<&Gym> {
        self.gyms.iter().find(|g| g.gym_id == gym_id)
    }

    /// Gyms sorted by `(priority, gym_id)`
    #[must_use]
    pub fn gyms_by_priority(&self) -> Vec<&Gym> {
        let mut gyms: Vec<&Gym> = self.gyms.iter().filter(|g| !g.gym_id.is_empty()).collect();
        gyms.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        gyms
    }
}

/// Planning preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPrefs {
    /// Maximum number of hard days per week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_day_cap_per_week: Option<u32>,
    /// Number of days the planner aims to fill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_training_days_per_week: Option<u32>,
    /// Gym used when a slot names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gym_id: Option<String>,
}

/// Active injuries and restrictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limitations {
    /// Flags such as `elbow_left`
    #[serde(default)]
    pub active_flags: Vec<String>,
    /// Free-form detail records
    #[serde(default)]
    pub details: Vec<Value>,
}

/// Hangboard baseline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HangboardBaseline {
    /// Best total load (bodyweight plus added)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_load_kg: Option<f64>,
    /// Edge depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_mm: Option<u32>,
    /// Grip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grip: Option<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Baseline measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    /// Hangboard baselines, first entry is the reference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hangboard: Vec<HangboardBaseline>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stimulus categories tracked for recency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusCategory {
    /// Hangboard and finger loading
    FingerStrength,
    /// Limit bouldering and campus work
    BoulderPower,
    /// Aerobic and power endurance
    Endurance,
    /// Everything else
    Complementaries,
}

impl StimulusCategory {
    /// Every category in canonical order
    pub const ALL: [Self; 4] = [
        Self::FingerStrength,
        Self::BoulderPower,
        Self::Endurance,
        Self::Complementaries,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FingerStrength => "finger_strength",
            Self::BoulderPower => "boulder_power",
            Self::Endurance => "endurance",
            Self::Complementaries => "complementaries",
        }
    }
}

/// Recency record for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyEntry {
    /// Last day a session of this category was completed
    pub last_done_date: Option<NaiveDate>,
    /// Last day a session of this category was skipped
    pub last_skipped_date: Option<NaiveDate>,
    /// Completed count
    #[serde(default)]
    pub done_count: u32,
    /// Skipped count
    #[serde(default)]
    pub skipped_count: u32,
}

/// Cumulative fatigue counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatigueProxy {
    /// Sessions logged as done
    #[serde(default)]
    pub done_sessions_total: u32,
    /// Sessions logged as skipped
    #[serde(default)]
    pub skipped_sessions_total: u32,
    /// Hard sessions done
    #[serde(default)]
    pub hard_sessions_total: u32,
    /// Finger sessions done
    #[serde(default)]
    pub finger_sessions_total: u32,
    /// Endurance sessions done
    #[serde(default)]
    pub endurance_sessions_total: u32,
    /// Date of the last update
    #[serde(default)]
    pub last_updated_date: Option<NaiveDate>,
}

/// Last known prescription for an (exercise, setup) pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingLoadEntry {
    /// Exercise id
    pub exercise_id: String,
    /// Canonical setup key
    pub key: String,
    /// Setup fields that make up the key
    #[serde(default)]
    pub setup: Map<String, Value>,
    /// Whether the last attempt was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<bool>,
    /// Last canonical feedback label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_feedback_label: Option<FeedbackLabel>,
    /// Added load used last time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_external_load_kg: Option<f64>,
    /// Total load used last time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_total_load_kg: Option<f64>,
    /// Added load for the next session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_external_load_kg: Option<f64>,
    /// Total load for the next session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_total_load_kg: Option<f64>,
    /// Boulder surface used last time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_selected: Option<String>,
    /// Grade used last time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_grade: Option<String>,
    /// Grade to aim for next time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_target_grade: Option<String>,
    /// Date of the last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
}

/// Load adjustment band for one feedback label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    /// `[low, high]` fractional change
    pub pct_range: [f64; 2],
}

impl AdjustmentRule {
    /// Midpoint of the band
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.pct_range[0] + self.pct_range[1]) / 2.0
    }
}

/// Policy rules applied when updating working loads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingLoadRules {
    /// Adjustment band per label
    #[serde(default = "default_adjustment_policy")]
    pub adjustment_policy: BTreeMap<FeedbackLabel, AdjustmentRule>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for WorkingLoadRules {
    fn default() -> Self {
        Self {
            adjustment_policy: default_adjustment_policy(),
            extra: Map::new(),
        }
    }
}

fn default_adjustment_policy() -> BTreeMap<FeedbackLabel, AdjustmentRule> {
    [
        (FeedbackLabel::VeryEasy, [0.1, 0.2]),
        (FeedbackLabel::Easy, [0.05, 0.1]),
        (FeedbackLabel::Ok, [0.0, 0.05]),
        (FeedbackLabel::Hard, [-0.05, 0.0]),
        (FeedbackLabel::VeryHard, [-0.15, -0.05]),
    ]
    .into_iter()
    .map(|(label, pct_range)| (label, AdjustmentRule { pct_range }))
    .collect()
}

/// Working loads and their update rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingLoads {
    /// Entries, unique by key and sorted by `(exercise_id, key)`
    #[serde(default)]
    pub entries: Vec<WorkingLoadEntry>,
    /// Update rules
    #[serde(default)]
    pub rules: WorkingLoadRules,
}

impl WorkingLoads {
    /// Entry with the exact key
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&WorkingLoadEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Insert or replace an entry, keeping the list unique and sorted
    pub fn upsert(&mut self, entry: WorkingLoadEntry) {
        self.entries
            .retain(|e| !(e.exercise_id == entry.exercise_id && e.key == entry.key));
        self.entries.push(entry);
        self.entries.sort_by(|a, b| {
            a.exercise_id
                .cmp(&b.exercise_id)
                .then_with(|| a.key.cmp(&b.key))
        });
    }
}

/// A recorded max-strength test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxStrengthTest {
    /// Test id
    pub test_id: String,
    /// Test date
    pub date: NaiveDate,
    /// Exercise used
    pub exercise_id: String,
    /// Bodyweight on the day
    #[serde(default)]
    pub bodyweight_kg: Option<f64>,
    /// Total load held
    pub total_load_kg: f64,
    /// Added load
    #[serde(default)]
    pub external_load_kg: Option<f64>,
    /// Test setup
    #[serde(default)]
    pub setup: Map<String, Value>,
    /// Staleness rules
    #[serde(default)]
    pub freshness_policy: Value,
    /// Confidence label
    #[serde(default)]
    pub confidence: String,
}

/// Recorded test results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tests {
    /// Max-strength tests sorted by `(date, test_id)`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub max_strength: Vec<MaxStrengthTest>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tests {
    /// Append a test and restore the ordering
    pub fn record_max_strength(&mut self, test: MaxStrengthTest) {
        self.max_strength.push(test);
        self.max_strength
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.test_id.cmp(&b.test_id)));
    }
}

/// A pending test session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQueueItem {
    /// Test id
    pub test_id: String,
    /// Day the test should happen by
    pub recommended_by_date: NaiveDate,
    /// Why the test was enqueued
    pub reason: String,
    /// Day the item was enqueued
    pub created_at: NaiveDate,
}

impl TestQueueItem {
    fn ordering(&self, other: &Self) -> Ordering {
        self.recommended_by_date
            .cmp(&other.recommended_by_date)
            .then_with(|| self.test_id.cmp(&other.test_id))
            .then_with(|| self.created_at.cmp(&other.created_at))
    }
}

/// Compressed per-session feedback record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLogEntry {
    /// Session date
    pub date: NaiveDate,
    /// First session id of the day
    pub session_id: String,
    /// Fatigue-weighted difficulty
    pub difficulty: FeedbackLabel,
}

/// How an override changes the load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideMode {
    /// Replace the load
    AbsoluteLoadKg,
    /// Add to the load
    DeltaKg,
    /// Scale the load
    Multiplier,
}

/// Remaining lifetime of an override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideExpiry {
    /// Only `occurrences` counts down
    #[serde(rename = "type")]
    pub kind: String,
    /// Remaining uses
    pub n: i64,
}

/// Per-exercise load override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseOverride {
    /// Mode
    pub mode: OverrideMode,
    /// Mode argument
    pub value: f64,
    /// Lifetime, absent means permanent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<OverrideExpiry>,
}

/// Manual overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    /// Overrides keyed by exercise id
    #[serde(default)]
    pub per_exercise: BTreeMap<String, ExerciseOverride>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cooldown on one exercise cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterCooldown {
    /// Last day of the cooldown
    #[serde(default)]
    pub until_date: Option<NaiveDate>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Active cluster cooldowns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    /// Cooldowns keyed by cluster key
    #[serde(default)]
    pub per_cluster: BTreeMap<String, ClusterCooldown>,
}

impl Cooldowns {
    /// Whether the cluster is cooling down on the given day
    #[must_use]
    pub fn active_until(&self, cluster: &str, on: NaiveDate) -> Option<NaiveDate> {
        self.per_cluster
            .get(cluster)
            .and_then(|c| c.until_date)
            .filter(|until| *until >= on)
    }
}

/// Consecutive-label streaks for the max hang test trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionCounters {
    /// Consecutive hard or very hard labels
    #[serde(default)]
    pub max_hang_5s_hard_streak: u32,
    /// Consecutive easy or very easy labels
    #[serde(default)]
    pub max_hang_5s_easy_streak: u32,
}

/// Grade offsets applied to the boulder benchmark per block kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoulderOffsets {
    /// Warmup and technique blocks
    #[serde(default = "offset_warmup")]
    pub warmup_tech: i32,
    /// Volume blocks
    #[serde(default = "offset_volume")]
    pub volume: i32,
    /// Limit and power blocks
    #[serde(default)]
    pub limit_power: i32,
    /// Anything else
    #[serde(default = "offset_volume")]
    pub default: i32,
}

const fn offset_warmup() -> i32 {
    -2
}

const fn offset_volume() -> i32 {
    -1
}

impl Default for BoulderOffsets {
    fn default() -> Self {
        Self {
            warmup_tech: offset_warmup(),
            volume: offset_volume(),
            limit_power: 0,
            default: offset_volume(),
        }
    }
}

/// Boulder target settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoulderTargetsConfig {
    /// Offsets per block kind
    #[serde(default)]
    pub offsets: BoulderOffsets,
}

/// User-tunable progression settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Boulder target settings
    #[serde(default)]
    pub boulder_targets: BoulderTargetsConfig,
}

/// The whole user-state document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    /// Document schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Identity
    #[serde(default)]
    pub user: UserProfile,
    /// Assessment inputs and computed profile
    #[serde(default)]
    pub assessment: AssessmentInputs,
    /// Current goal
    #[serde(default)]
    pub goal: Goal,
    /// Weekly availability
    #[serde(default)]
    pub availability: AvailabilityInput,
    /// Equipment
    #[serde(default)]
    pub equipment: Equipment,
    /// Planning preferences
    #[serde(default)]
    pub planning_prefs: PlanningPrefs,
    /// Limitations
    #[serde(default)]
    pub limitations: Limitations,
    /// Upcoming trips
    #[serde(default)]
    pub trips: Vec<Trip>,
    /// Current macrocycle
    #[serde(default)]
    pub macrocycle: Option<Macrocycle>,
    /// Performance levels, free-form
    #[serde(default)]
    pub performance: Map<String, Value>,
    /// Baselines
    #[serde(default)]
    pub baselines: Baselines,
    /// Recent session summaries
    #[serde(default)]
    pub recent_sessions: Vec<Value>,
    /// Recency per stimulus category
    #[serde(default)]
    pub stimulus_recency: BTreeMap<StimulusCategory, RecencyEntry>,
    /// Fatigue counters
    #[serde(default)]
    pub fatigue_proxy: FatigueProxy,
    /// Working loads
    #[serde(default)]
    pub working_loads: WorkingLoads,
    /// Recorded tests
    #[serde(default)]
    pub tests: Tests,
    /// Body metrics
    #[serde(default)]
    pub body: BodyMetrics,
    /// Bodyweight shortcut used by progression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bodyweight_kg: Option<f64>,
    /// Cached plan for the current week
    #[serde(default)]
    pub current_week_plan: Option<WeekPlan>,
    /// Last feedback records, newest first
    #[serde(default)]
    pub feedback_log: Vec<FeedbackLogEntry>,
    /// Pending tests
    #[serde(default)]
    pub test_queue: Vec<TestQueueItem>,
    /// Manual load overrides
    #[serde(default)]
    pub overrides: Overrides,
    /// Cluster cooldowns
    #[serde(default)]
    pub cooldowns: Cooldowns,
    /// Free-form adjustments
    #[serde(default)]
    pub adjustments: Map<String, Value>,
    /// Quote rotation history
    #[serde(default)]
    pub quote_history: Vec<Value>,
    /// Streak counters
    #[serde(default)]
    pub progression_counters: ProgressionCounters,
    /// Progression settings
    #[serde(default)]
    pub progression_config: ProgressionConfig,
    /// Keys this version does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_schema_version() -> String {
    USER_STATE_SCHEMA_VERSION.to_owned()
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            user: UserProfile::default(),
            assessment: AssessmentInputs::default(),
            goal: Goal::default(),
            availability: AvailabilityInput::default(),
            equipment: Equipment::default(),
            planning_prefs: PlanningPrefs::default(),
            limitations: Limitations::default(),
            trips: Vec::new(),
            macrocycle: None,
            performance: Map::new(),
            baselines: Baselines::default(),
            recent_sessions: Vec::new(),
            stimulus_recency: BTreeMap::new(),
            fatigue_proxy: FatigueProxy::default(),
            working_loads: WorkingLoads::default(),
            tests: Tests::default(),
            body: BodyMetrics::default(),
            bodyweight_kg: None,
            current_week_plan: None,
            feedback_log: Vec::new(),
            test_queue: Vec::new(),
            overrides: Overrides::default(),
            cooldowns: Cooldowns::default(),
            adjustments: Map::new(),
            quote_history: Vec::new(),
            progression_counters: ProgressionCounters::default(),
            progression_config: ProgressionConfig::default(),
            extra: Map::new(),
        }
    }
}

impl UserState {
    /// Empty template for a new user
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bodyweight from the shortcut field, then body metrics
    #[must_use]
    pub fn bodyweight(&self) -> Option<f64> {
        self.bodyweight_kg
            .or(self.body.weight_kg)
            .or(self.assessment.body.weight_kg)
    }

    /// Default gym id, ignoring empty strings
    #[must_use]
    pub fn default_gym_id(&self) -> Option<&str> {
        self.planning_prefs
            .default_gym_id
            .as_deref()
            .filter(|g| !g.is_empty())
    }

    /// Drop the cached week plan
    pub fn invalidate_week_cache(&mut self) {
        self.current_week_plan = None;
    }

    /// Benchmark boulder grade used to derive limit-bouldering targets
    #[must_use]
    pub fn boulder_benchmark_grade(&self) -> Option<&str> {
        const PATHS: [&[&str]; 3] = [
            &["gym_reference", "kilter", "benchmark", "grade"],
            &["current_level", "gym_reference", "kilter", "benchmark", "grade"],
            &["current_level", "boulder", "worked", "grade"],
        ];
        PATHS.iter().find_map(|path| {
            let (first, rest) = path.split_first()?;
            let mut node = self.performance.get(*first)?;
            for segment in rest {
                node = node.get(*segment)?;
            }
            node.as_str().map(str::trim).filter(|g| !g.is_empty())
        })
    }

    /// Enqueue a test unless the same test was enqueued within `dedupe_days`
    ///
    /// Returns whether the item was added.
    pub fn enqueue_test(&mut self, item: TestQueueItem, dedupe_days: i64) -> bool {
        let duplicate = self.test_queue.iter().any(|q| {
            q.test_id == item.test_id
                && (q.created_at - item.created_at).num_days().abs() <= dedupe_days
        });
        if duplicate {
            return false;
        }
        self.test_queue.push(item);
        self.test_queue.sort_by(TestQueueItem::ordering);
        true
    }

    /// Push a feedback record, keeping the newest entries first
    pub fn push_feedback(&mut self, entry: FeedbackLogEntry) {
        self.feedback_log.push(entry);
        self.feedback_log.sort_by(|a, b| b.date.cmp(&a.date));
        self.feedback_log.truncate(FEEDBACK_LOG_CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_document_deserializes_to_template() {
        let state: UserState = serde_json::from_value(json!({})).unwrap();
        assert_eq!(state.schema_version, "1.5");
        assert!(state.current_week_plan.is_none());
        assert_eq!(state.working_loads.rules, WorkingLoadRules::default());
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let state: UserState =
            serde_json::from_value(json!({"custom_block": {"a": 1}, "goal": {}})).unwrap();
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["custom_block"]["a"], 1);
        assert!(back["macrocycle"].is_null());
    }

    #[test]
    fn test_default_policy_midpoints() {
        let rules = WorkingLoadRules::default();
        let very_hard = &rules.adjustment_policy[&FeedbackLabel::VeryHard];
        assert!((very_hard.midpoint() + 0.10).abs() < 1e-9);
        let ok = &rules.adjustment_policy[&FeedbackLabel::Ok];
        assert!((ok.midpoint() - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_enqueue_dedupes_within_window() {
        let mut state = UserState::empty();
        let item = |created: &str, by: &str| TestQueueItem {
            test_id: "max_hang_5s_total_load".into(),
            recommended_by_date: date(by),
            reason: "r".into(),
            created_at: date(created),
        };
        assert!(state.enqueue_test(item("2026-01-06", "2026-01-13"), 21));
        assert!(!state.enqueue_test(item("2026-01-20", "2026-01-27"), 21));
        assert!(state.enqueue_test(item("2026-02-10", "2026-02-17"), 21));
        assert_eq!(state.test_queue.len(), 2);
        assert!(state.test_queue[0].recommended_by_date < state.test_queue[1].recommended_by_date);
    }

    #[test]
    fn test_feedback_log_keeps_newest_seven() {
        let mut state = UserState::empty();
        for day in 1..=9 {
            state.push_feedback(FeedbackLogEntry {
                date: date(&format!("2026-01-{day:02}")),
                session_id: "s".into(),
                difficulty: FeedbackLabel::Ok,
            });
        }
        assert_eq!(state.feedback_log.len(), FEEDBACK_LOG_CAPACITY);
        assert_eq!(state.feedback_log[0].date, date("2026-01-09"));
        assert_eq!(state.feedback_log[6].date, date("2026-01-03"));
    }

    #[test]
    fn test_working_load_upsert_is_unique_and_sorted() {
        let mut loads = WorkingLoads::default();
        let entry = |id: &str, key: &str, next: f64| WorkingLoadEntry {
            exercise_id: id.into(),
            key: key.into(),
            next_external_load_kg: Some(next),
            ..WorkingLoadEntry::default()
        };
        loads.upsert(entry("pullup", "pullup", 5.0));
        loads.upsert(entry("max_hang_5s", "max_hang_5s|edge_mm=20", 10.0));
        loads.upsert(entry("pullup", "pullup", 7.5));
        assert_eq!(loads.entries.len(), 2);
        assert_eq!(loads.entries[0].exercise_id, "max_hang_5s");
        assert_eq!(loads.entry("pullup").unwrap().next_external_load_kg, Some(7.5));
    }

    #[test]
    fn test_benchmark_grade_lookup_order() {
        let mut state = UserState::empty();
        state.performance = json!({
            "current_level": {"boulder": {"worked": {"grade": "6C+"}}}
        })
        .as_object()
        .cloned()
        .unwrap();
        assert_eq!(state.boulder_benchmark_grade(), Some("6C+"));
        state.performance.insert(
            "gym_reference".into(),
            json!({"kilter": {"benchmark": {"grade": "7A"}}}),
        );
        assert_eq!(state.boulder_benchmark_grade(), Some("7A"));
    }

    #[test]
    fn test_gyms_sorted_by_priority_then_id() {
        let equipment: Equipment = serde_json::from_value(json!({
            "home": ["Hangboard"],
            "gyms": [
                {"gym_id": "zeta", "priority": 1, "equipment": ["spraywall"]},
                {"gym_id": "alpha", "priority": 2, "equipment": []},
                {"gym_id": "beta", "priority": 1, "equipment": "board_kilter"}
            ]
        }))
        .unwrap();
        let ids: Vec<&str> = equipment
            .gyms_by_priority()
            .iter()
            .map(|g| g.gym_id.as_str())
            .collect();
        assert_eq!(ids, ["beta", "zeta", "alpha"]);
        assert_eq!(equipment.home, ["hangboard"]);
        assert!(equipment.gym("beta").unwrap().has("board_kilter"));
    }
}
