// ABOUTME: Session resolver expanding catalog sessions into concrete exercise instances
// ABOUTME: Runs the staged filter pipeline per block with cooldowns, exclusion, scoring, and fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Session Resolver
//!
//! A session is an ordered list of modules. Template modules expand into
//! their blocks; inline modules are blocks themselves. Every block ends up
//! `selected`, `skipped` or `failed` with a filter trace explaining the
//! outcome, so a block never disappears silently.
//!
//! Dynamic blocks run a fold over the catalog:
//!
//! 1. hard filters (location, equipment, role, domain, pattern)
//! 2. cluster cooldowns active on the target date
//! 3. exclusion of exercises already picked in this session
//! 4. scoring by setup preference and recency, ties by id
//!
//! The primary filter set runs first, then each fallback in order.

/// Cluster keys and cooldown substitutes
pub mod cluster;
/// Candidate filters and scoring
pub mod filters;
/// Prescription merge and overrides
pub mod prescription;

use chrono::NaiveDate;
use crux_core::dates::now_timestamp;
use crux_core::errors::PlanningError;
use crux_core::models::{
    Block, BlockStatus, Catalog, CooldownNote, Cooldowns, Equipment, Exercise, ExerciseInstance,
    FilterSet, FilterTrace, InstanceSource, Location, Overrides, ResolutionStatus, ResolveContext,
    ResolvedBlock, ResolvedBody, ResolvedModule, ResolvedSession, SelectedExercise,
    SessionDefinition, SessionIdentity, SessionModule, UserState, RESOLVER_VERSION,
    SESSION_INSTANCE_VERSION,
};
use std::collections::BTreeSet;
use std::iter;
use tracing::{debug, info};

use crate::config::{PlanningConfig, ResolverConfig};
use crate::training_constants::equipment;

pub use cluster::cluster_key;
pub use prescription::consume_overrides;

const P_STAGE: &str = "P0";
const MAIN_BLOCK: &str = "main";

/// Inputs of [`resolve_session`]
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// Catalog session id
    pub session_id: &'a str,
    /// Immutable catalog
    pub catalog: &'a Catalog,
    /// Home and gym equipment
    pub equipment: &'a Equipment,
    /// Location override; falls back to the session's location, then home
    pub location: Option<Location>,
    /// Gym override; falls back to the session's gym, then the default gym
    pub gym_id: Option<&'a str>,
    /// User's default gym
    pub default_gym_id: Option<&'a str>,
    /// Day the session is planned for; cooldowns apply only with a date
    pub target_date: Option<NaiveDate>,
    /// Manual load overrides
    pub overrides: &'a Overrides,
    /// Active cluster cooldowns
    pub cooldowns: &'a Cooldowns,
    /// Recently used exercise ids, most recent first
    pub recent_exercise_ids: &'a [String],
}

impl<'a> ResolveRequest<'a> {
    /// Request drawing equipment, overrides, and cooldowns from user state
    #[must_use]
    pub fn new(session_id: &'a str, catalog: &'a Catalog, state: &'a UserState) -> Self {
        Self {
            session_id,
            catalog,
            equipment: &state.equipment,
            location: None,
            gym_id: None,
            default_gym_id: state.default_gym_id(),
            target_date: None,
            overrides: &state.overrides,
            cooldowns: &state.cooldowns,
            recent_exercise_ids: &[],
        }
    }

    /// Set the location
    #[must_use]
    pub const fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Set the gym
    #[must_use]
    pub const fn with_gym(mut self, gym_id: Option<&'a str>) -> Self {
        self.gym_id = gym_id;
        self
    }

    /// Set the target date
    #[must_use]
    pub const fn with_date(mut self, target_date: Option<NaiveDate>) -> Self {
        self.target_date = target_date;
        self
    }

    /// Resolve against `overrides` instead of the state's
    #[must_use]
    pub const fn with_overrides(mut self, overrides: &'a Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the recency list
    #[must_use]
    pub const fn with_recent(mut self, recent: &'a [String]) -> Self {
        self.recent_exercise_ids = recent;
        self
    }
}

// ============================================================================
// Context
// ============================================================================

/// Equipment tokens the session's blocks ask for through `equipment_any`
fn demanded_equipment(catalog: &Catalog, session: &SessionDefinition) -> BTreeSet<String> {
    let mut demanded = BTreeSet::new();
    let mut collect = |block: &Block| {
        demanded.extend(block.primary_filters().equipment_any);
        for fallback in block.fallback_filters() {
            demanded.extend(fallback.equipment_any);
        }
    };
    for module in &session.modules {
        match module {
            SessionModule::Inline(block) => collect(block),
            other => {
                if let Some(template) = other
                    .template_ref()
                    .and_then(|r| catalog.template(&r.template_id))
                {
                    template.blocks.iter().for_each(&mut collect);
                }
            }
        }
    }
    demanded
}

/// Gym for a gym session without one in its context
///
/// Order: request gym, session gym, first gym by `(priority, gym_id)` that
/// has equipment a block demands, the default gym, the first gym.
fn pick_gym(request: &ResolveRequest<'_>, session: &SessionDefinition) -> Option<String> {
    let explicit = request
        .gym_id
        .or(session.gym_id.as_deref())
        .filter(|g| !g.is_empty());
    if let Some(gym_id) = explicit {
        return Some(gym_id.to_owned());
    }
    let gyms = request.equipment.gyms_by_priority();
    let demanded = demanded_equipment(request.catalog, session);
    if let Some(gym) = gyms
        .iter()
        .find(|g| demanded.iter().any(|token| g.has(token)))
    {
        return Some(gym.gym_id.clone());
    }
    request
        .default_gym_id
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .or_else(|| gyms.first().map(|g| g.gym_id.clone()))
}

/// Equipment reachable at the location, plus the virtual floor and the weight implication
#[must_use]
pub fn available_equipment(
    equipment_state: &Equipment,
    location: Location,
    gym_id: Option<&str>,
) -> Vec<String> {
    let mut available: BTreeSet<String> = match location {
        Location::Home => equipment_state.home.iter().cloned().collect(),
        Location::Gym => gym_id
            .and_then(|id| equipment_state.gym(id))
            .map(|g| g.equipment.iter().cloned().collect())
            .unwrap_or_default(),
        Location::Outdoor => BTreeSet::new(),
    };
    if equipment::WEIGHT_SUBTYPES
        .iter()
        .any(|w| available.contains(*w))
    {
        available.insert(equipment::WEIGHT.to_owned());
    }
    available.insert(equipment::FLOOR.to_owned());
    available.into_iter().collect()
}

// ============================================================================
// Block resolution
// ============================================================================

/// Per-session mutable resolution state
struct Resolution<'r, 'a> {
    request: &'r ResolveRequest<'a>,
    config: &'r ResolverConfig,
    location: Location,
    available: Vec<String>,
    picked: Vec<String>,
    blocks: Vec<ResolvedBlock>,
    instances: Vec<ExerciseInstance>,
}

/// Outcome of the dynamic pipeline for one filter set
struct Pick<'c> {
    exercise: &'c Exercise,
    note: Option<CooldownNote>,
    trace_note: Option<&'static str>,
}

impl<'r, 'a> Resolution<'r, 'a> {
    fn exercises(&self) -> &'a [Exercise] {
        self.request.catalog.exercises()
    }

    fn cooling_until(&self, exercise: &Exercise) -> Option<NaiveDate> {
        let date = self.request.target_date?;
        self.request
            .cooldowns
            .active_until(&cluster_key(exercise), date)
    }

    /// Run one filter set through every stage
    fn run_filters(&self, block: &Block, filters: &FilterSet, trace: &mut FilterTrace) -> Option<Pick<'a>> {
        let exercises = self.exercises();
        let pool = filters::hard_filter(exercises, self.location, &self.available, filters, trace);

        let (cooled, cooling): (Vec<&Exercise>, Vec<&Exercise>) =
            pool.iter().copied().partition(|e| self.cooling_until(e).is_none());
        trace.counts.insert("after_cooldown".to_owned(), cooled.len());

        let recent = self.request.recent_exercise_ids;
        if cooled.is_empty() && !cooling.is_empty() && block.block_type == MAIN_BLOCK {
            return self.cooldown_pick(&cooling, trace);
        }

        let fresh: Vec<&Exercise> = cooled
            .iter()
            .copied()
            .filter(|e| !self.picked.contains(&e.id))
            .collect();
        trace.counts.insert("after_exclusion".to_owned(), fresh.len());
        if fresh.is_empty() && !cooled.is_empty() {
            debug!(block_type = %block.block_type, "exclusion relaxed, every candidate already picked");
            return filters::best(&cooled, recent, self.config).map(|exercise| Pick {
                exercise,
                note: None,
                trace_note: Some("exclusion_relaxed"),
            });
        }
        filters::best(&fresh, recent, self.config).map(|exercise| Pick {
            exercise,
            note: None,
            trace_note: None,
        })
    }

    /// Main block whose whole pool is cooling down: substitute, else downshift
    fn cooldown_pick(&self, cooling: &[&'a Exercise], trace: &mut FilterTrace) -> Option<Pick<'a>> {
        let current = filters::best(cooling, self.request.recent_exercise_ids, self.config)?;
        let until_date = self.cooling_until(current)?;
        let cluster = cluster_key(current);
        let substitute = cluster::cooldown_fallback(self.exercises(), current, &self.available)
            .filter(|e| e.location_allowed.contains(&self.location));
        trace.counts.insert("after_exclusion".to_owned(), 1);
        Some(match substitute {
            Some(exercise) => Pick {
                exercise,
                note: Some(CooldownNote {
                    cooldown_cluster: cluster,
                    until_date,
                    fallback_exercise_id: Some(exercise.id.clone()),
                    reason: "cluster_cooldown_fallback".to_owned(),
                    multiplier: None,
                }),
                trace_note: Some("cluster_cooldown_fallback"),
            },
            None => Pick {
                exercise: current,
                note: Some(CooldownNote {
                    cooldown_cluster: cluster,
                    until_date,
                    fallback_exercise_id: None,
                    reason: "cluster_cooldown_downshift".to_owned(),
                    multiplier: Some(self.config.cooldown_downshift_multiplier),
                }),
                trace_note: Some("cluster_cooldown_downshift"),
            },
        })
    }

    fn resolve_block(
        &mut self,
        block: &Block,
        template_id: Option<&str>,
        block_id: String,
        module_required: bool,
    ) {
        let block_uid = format!("{}.{block_id}", template_id.unwrap_or(self.request.session_id));
        let required = module_required && block.required;
        let mut resolved = ResolvedBlock {
            block_uid: block_uid.clone(),
            block_id: block_id.clone(),
            block_type: block.block_type.clone(),
            template_id: template_id.map(str::to_owned),
            required,
            status: BlockStatus::Skipped,
            message: None,
            instructions: None,
            filter_trace: FilterTrace {
                p_stage: P_STAGE.to_owned(),
                ..FilterTrace::default()
            },
            selected_exercises: Vec::new(),
        };

        if block.is_instruction_only() {
            resolved.status = BlockStatus::Selected;
            resolved.message = Some("Instruction-only block (no exercise selection).".to_owned());
            resolved.instructions = Some(block.instructions());
            resolved.filter_trace.note = Some("instruction_only: no selection performed".to_owned());
            self.blocks.push(resolved);
            return;
        }

        let (pick, picked_by) = if let Some(explicit) = block.exercise_id.as_deref() {
            resolved.filter_trace.note = Some("explicit_exercise_id: bypassed P0 filters".to_owned());
            match self.request.catalog.exercise(explicit) {
                Some(exercise) => (
                    Some(Pick {
                        exercise,
                        note: None,
                        trace_note: None,
                    }),
                    "explicit_exercise_id",
                ),
                None => {
                    let message = format!("Unknown exercise_id: {explicit}");
                    resolved.status = BlockStatus::Failed;
                    resolved.filter_trace.error = Some(message.clone());
                    resolved.message = Some(message);
                    self.blocks.push(resolved);
                    return;
                }
            }
        } else {
            let primary = block.primary_filters();
            if primary.role.is_none() {
                let message = "Missing block.role (P0 requires role for selection).".to_owned();
                resolved.status = BlockStatus::Failed;
                resolved.filter_trace.error = Some(message.clone());
                resolved.message = Some(message);
                self.blocks.push(resolved);
                return;
            }
            let stages = iter::once(("primary".to_owned(), primary)).chain(
                block
                    .fallback_filters()
                    .into_iter()
                    .enumerate()
                    .map(|(i, f)| (format!("fallback[{i}]"), f)),
            );
            let mut found = None;
            for (source, filters) in stages {
                let mut trace = FilterTrace {
                    p_stage: P_STAGE.to_owned(),
                    filter_source: Some(source),
                    ..FilterTrace::default()
                };
                let pick = self.run_filters(block, &filters, &mut trace);
                resolved.filter_trace = trace;
                if pick.is_some() {
                    found = pick;
                    break;
                }
            }
            (found, "p0_hard_filters")
        };

        let Some(pick) = pick else {
            resolved.message = Some("No candidates after hard filters (P0).".to_owned());
            debug!(block_uid = %block_uid, counts = ?resolved.filter_trace.counts, "block skipped");
            self.blocks.push(resolved);
            return;
        };

        if let Some(note) = pick.trace_note {
            resolved.filter_trace.note = Some(note.to_owned());
        }
        let exercise = pick.exercise;
        let mut merged = prescription::merge(&exercise.prescription_defaults, &block.prescription);
        if let Some(multiplier) = pick.note.as_ref().and_then(|n| n.multiplier) {
            prescription::apply_downshift(&mut merged, multiplier);
        }
        if let Some(rule) = self.request.overrides.per_exercise.get(&exercise.id) {
            prescription::apply_override(&mut merged, rule);
        }

        let instance_id = format!("{block_id}_{:02}", self.instances.len() + 1);
        self.instances.push(ExerciseInstance {
            instance_id,
            exercise_id: exercise.id.clone(),
            prescription: merged.clone(),
            block_uid,
            source: InstanceSource {
                picked_by: format!("resolver/{picked_by}"),
                template_id: template_id.map(str::to_owned),
                block_id,
            },
            fatigue_cost: exercise.fatigue_cost,
            replanner: pick.note,
            suggested: None,
        });
        self.picked.push(exercise.id.clone());
        resolved.status = BlockStatus::Selected;
        resolved.selected_exercises.push(SelectedExercise {
            exercise_id: exercise.id.clone(),
            prescription: merged,
        });
        self.blocks.push(resolved);
    }

    fn template_missing(&mut self, template_id: &str, required: bool) {
        let message = format!("Template not found: {template_id}");
        self.blocks.push(ResolvedBlock {
            block_uid: format!("{template_id}.missing"),
            block_id: "missing".to_owned(),
            block_type: MAIN_BLOCK.to_owned(),
            template_id: Some(template_id.to_owned()),
            required,
            status: BlockStatus::Failed,
            message: Some(message.clone()),
            instructions: None,
            filter_trace: FilterTrace {
                p_stage: P_STAGE.to_owned(),
                error: Some(message),
                ..FilterTrace::default()
            },
            selected_exercises: Vec::new(),
        });
    }
}

fn resolution_status(blocks: &[ResolvedBlock]) -> ResolutionStatus {
    let required: Vec<&ResolvedBlock> = blocks.iter().filter(|b| b.required).collect();
    let failed = required
        .iter()
        .filter(|b| b.status == BlockStatus::Failed)
        .count();
    if failed == 0 {
        ResolutionStatus::Success
    } else if failed == required.len() {
        ResolutionStatus::Failed
    } else {
        ResolutionStatus::Partial
    }
}

/// Resolve a catalog session into concrete exercises
///
/// # Errors
///
/// Returns [`PlanningError::SessionNotFound`] when the catalog has no such session.
pub fn resolve_session(request: &ResolveRequest<'_>) -> Result<ResolvedSession, PlanningError> {
    let session = request
        .catalog
        .session(request.session_id)
        .ok_or_else(|| PlanningError::session_not_found(request.session_id))?;

    let location = request
        .location
        .or(session.location)
        .unwrap_or(Location::Home);
    let gym_id = (location == Location::Gym)
        .then(|| pick_gym(request, session))
        .flatten();
    let available = available_equipment(request.equipment, location, gym_id.as_deref());

    let mut resolution = Resolution {
        request,
        config: &PlanningConfig::global().resolver,
        location,
        available: available.clone(),
        picked: Vec::new(),
        blocks: Vec::new(),
        instances: Vec::new(),
    };
    let mut modules = Vec::with_capacity(session.modules.len());

    for module in &session.modules {
        match module {
            SessionModule::Inline(block) => {
                let block_id = block
                    .block_id
                    .clone()
                    .unwrap_or_else(|| format!("inline_block_{}", resolution.blocks.len() + 1));
                modules.push(ResolvedModule {
                    template_id: None,
                    version: None,
                    inline_block_id: Some(block_id.clone()),
                });
                resolution.resolve_block(block, None, block_id, true);
            }
            other => {
                let Some(reference) = other.template_ref() else {
                    continue;
                };
                modules.push(ResolvedModule {
                    template_id: Some(reference.template_id.clone()),
                    version: Some(reference.version.clone()),
                    inline_block_id: None,
                });
                let Some(template) = request.catalog.template(&reference.template_id) else {
                    resolution.template_missing(&reference.template_id, reference.required);
                    continue;
                };
                for block in &template.blocks {
                    let block_id = block.block_id.clone().unwrap_or_else(|| {
                        format!("{}_block_{}", template.template_id, resolution.blocks.len() + 1)
                    });
                    resolution.resolve_block(
                        block,
                        Some(&template.template_id),
                        block_id,
                        reference.required,
                    );
                }
            }
        }
    }

    let status = resolution_status(&resolution.blocks);
    let session_load_score = resolution.instances.iter().map(|i| i.fatigue_cost).sum();
    info!(
        session_id = %session.session_id,
        location = %location,
        instances = resolution.instances.len(),
        status = ?status,
        "session resolved"
    );

    Ok(ResolvedSession {
        session_instance_version: SESSION_INSTANCE_VERSION.to_owned(),
        generated_at: now_timestamp(),
        context: ResolveContext {
            location,
            gym_id,
            target_date: request.target_date,
            available_equipment: available,
        },
        session: SessionIdentity {
            session_id: session.session_id.clone(),
            session_version: session.version.clone(),
            intent: session.intent.clone(),
            tags: session.tags.clone(),
        },
        resolved_session: ResolvedBody {
            resolver_version: RESOLVER_VERSION.to_owned(),
            modules,
            blocks: resolution.blocks,
            exercise_instances: resolution.instances,
        },
        resolution_status: status,
        session_load_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crux_core::dates::parse_date;
    use crux_core::models::{ClusterCooldown, ExerciseOverride, OverrideExpiry, OverrideMode, Template};
    use serde_json::json;

    fn catalog() -> Catalog {
        let exercises: Vec<Exercise> = serde_json::from_value(json!([
            {"id": "max_hang_5s", "role": ["main"], "domain": ["finger_strength"], "pattern": ["hang"],
             "location_allowed": ["gym", "home"], "equipment_required": ["hangboard"], "fatigue_cost": 8,
             "attributes": {"edge_mm": 20, "grip": "half_crimp"},
             "prescription_defaults": {"sets": 5, "work_seconds": 5, "load_kg": 10.0}},
            {"id": "density_hang", "role": ["secondary"], "domain": ["finger_strength"], "pattern": ["hang"],
             "location_allowed": ["gym", "home"], "equipment_required": ["hangboard"], "fatigue_cost": 5},
            {"id": "arm_circles", "role": ["warmup"], "domain": ["mobility"], "location_allowed": ["gym", "home", "outdoor"],
             "fatigue_cost": 1},
            {"id": "cooldown_forearm_wrist_stretch", "role": ["cooldown"], "domain": ["mobility"],
             "location_allowed": ["gym", "home", "outdoor"], "fatigue_cost": 1}
        ]))
        .unwrap();
        let templates: Vec<Template> = serde_json::from_value(json!([
            {"template_id": "finger_max", "blocks": [
                {"block_id": "warmup", "type": "warmup", "role": ["warmup"]},
                {"block_id": "main", "type": "main", "role": ["main"], "domain": ["finger_strength"],
                 "prescription": {"sets": 6}},
                {"block_id": "notes", "type": "main", "mode": "instruction_only", "focus": "quality"}
            ]},
            {"template_id": "board_work", "blocks": [
                {"block_id": "board", "type": "main", "role": ["main"],
                 "selection": {"primary": {"filters": {"equipment_any": ["board_kilter"]}}}}
            ]}
        ]))
        .unwrap();
        let sessions: Vec<SessionDefinition> = serde_json::from_value(json!([
            {"session_id": "finger_day", "location": "home", "modules": [
                "finger_max",
                {"block_id": "cooldown", "type": "cooldown", "role": ["cooldown"]}
            ]},
            {"session_id": "board_day", "location": "gym", "modules": ["board_work"]},
            {"session_id": "broken", "modules": ["missing_template", {"block_id": "x", "exercise_id": "nope"}]}
        ]))
        .unwrap();
        Catalog::new(exercises, templates, sessions)
    }

    fn state() -> UserState {
        serde_json::from_value(json!({
            "equipment": {
                "home": ["hangboard"],
                "gyms": [
                    {"gym_id": "alpha", "priority": 1, "equipment": ["spraywall"]},
                    {"gym_id": "blocx", "priority": 2, "equipment": ["board_kilter", "hangboard"]}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_blocks_resolve_in_order_with_instance_ids() {
        let catalog = catalog();
        let state = state();
        let resolved = resolve_session(&ResolveRequest::new("finger_day", &catalog, &state)).unwrap();
        let ids: Vec<&str> = resolved.instances().iter().map(|i| i.exercise_id.as_str()).collect();
        assert_eq!(ids, ["arm_circles", "max_hang_5s", "cooldown_forearm_wrist_stretch"]);
        assert_eq!(resolved.instances()[1].instance_id, "main_02");
        assert_eq!(resolved.instances()[1].prescription["sets"], 6);
        assert_eq!(resolved.instances()[1].source.picked_by, "resolver/p0_hard_filters");
        assert_eq!(resolved.session_load_score, 10);
        assert_eq!(resolved.resolution_status, ResolutionStatus::Success);
        let notes = resolved.block("notes").unwrap();
        assert_eq!(notes.status, BlockStatus::Selected);
        assert_eq!(notes.instructions.as_ref().unwrap()["focus"], "quality");
        assert_eq!(resolved.context.available_equipment, ["floor", "hangboard"]);
    }

    #[test]
    fn test_gym_chosen_by_demanded_equipment() {
        let catalog = catalog();
        let state = state();
        let resolved = resolve_session(&ResolveRequest::new("board_day", &catalog, &state)).unwrap();
        assert_eq!(resolved.context.gym_id.as_deref(), Some("blocx"));
        assert_eq!(resolved.block("board").unwrap().status, BlockStatus::Skipped);
        assert_eq!(
            resolved.block("board").unwrap().message.as_deref(),
            Some("No candidates after hard filters (P0).")
        );
    }

    #[test]
    fn test_demanded_equipment_outranks_default_gym() {
        let catalog = catalog();
        let mut state = state();
        state.planning_prefs.default_gym_id = Some("alpha".to_owned());

        let board = resolve_session(&ResolveRequest::new("board_day", &catalog, &state)).unwrap();
        assert_eq!(board.context.gym_id.as_deref(), Some("blocx"));

        let explicit = resolve_session(
            &ResolveRequest::new("board_day", &catalog, &state).with_gym(Some("alpha")),
        )
        .unwrap();
        assert_eq!(explicit.context.gym_id.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_missing_template_and_unknown_exercise_fail() {
        let catalog = catalog();
        let state = state();
        let resolved = resolve_session(&ResolveRequest::new("broken", &catalog, &state)).unwrap();
        assert_eq!(resolved.resolution_status, ResolutionStatus::Failed);
        assert!(resolved
            .resolved_session
            .blocks
            .iter()
            .all(|b| b.status == BlockStatus::Failed));
    }

    #[test]
    fn test_unknown_session_is_an_error() {
        let catalog = catalog();
        let state = state();
        let err = resolve_session(&ResolveRequest::new("nope", &catalog, &state)).unwrap_err();
        assert!(matches!(err, PlanningError::SessionNotFound { .. }));
    }

    #[test]
    fn test_cooldown_substitutes_within_cluster() {
        let catalog = catalog();
        let mut state = state();
        let key = cluster_key(catalog.exercise("max_hang_5s").unwrap());
        state.cooldowns.per_cluster.insert(
            key.clone(),
            ClusterCooldown {
                until_date: Some(parse_date("2026-03-10").unwrap()),
                ..ClusterCooldown::default()
            },
        );
        let resolved = resolve_session(
            &ResolveRequest::new("finger_day", &catalog, &state)
                .with_date(Some(parse_date("2026-03-09").unwrap())),
        )
        .unwrap();
        let main = &resolved.instances()[1];
        assert_eq!(main.exercise_id, "density_hang");
        let note = main.replanner.as_ref().unwrap();
        assert_eq!(note.reason, "cluster_cooldown_fallback");
        assert_eq!(note.cooldown_cluster, key);

        let after = resolve_session(
            &ResolveRequest::new("finger_day", &catalog, &state)
                .with_date(Some(parse_date("2026-03-11").unwrap())),
        )
        .unwrap();
        assert_eq!(after.instances()[1].exercise_id, "max_hang_5s");
    }

    #[test]
    fn test_override_applies_and_is_consumed() {
        let catalog = catalog();
        let mut state = state();
        state.overrides.per_exercise.insert(
            "max_hang_5s".into(),
            ExerciseOverride {
                mode: OverrideMode::DeltaKg,
                value: 2.5,
                expires: Some(OverrideExpiry {
                    kind: "occurrences".into(),
                    n: 1,
                }),
            },
        );
        let resolved = resolve_session(&ResolveRequest::new("finger_day", &catalog, &state)).unwrap();
        assert_eq!(resolved.instances()[1].prescription["load_kg"], 12.5);
        consume_overrides(&mut state.overrides, &resolved);
        assert!(state.overrides.per_exercise.is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = catalog();
        let state = state();
        let request = ResolveRequest::new("finger_day", &catalog, &state);
        let mut a = resolve_session(&request).unwrap();
        let mut b = resolve_session(&request).unwrap();
        a.generated_at.clear();
        b.generated_at.clear();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
