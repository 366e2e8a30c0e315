// ABOUTME: Phase-aware week planner packing pool sessions into a seven-day grid
// ABOUTME: Enforces hard-day cap, finger spacing, intensity cap, pre-trip deloads, and day quotas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! # Week Planner
//!
//! Placement runs in passes over the seven days of the week:
//!
//! 1. primary sessions (hard or climbing) on gym days first, evening first
//! 2. complementary sessions on the remaining quota days, lunch first
//! 3. one `finger_maintenance_home` in power-endurance weeks that have none
//! 4. benchmark tests on the last week of base and strength phases
//!
//! Deload weeks are then stripped of hard sessions and capped in volume.

/// Availability normalization
pub mod availability;

use chrono::NaiveDate;
use crux_core::dates::{add_days, now_timestamp};
use crux_core::models::{
    DomainWeights, ExplainEntry, Gym, Intensity, LoadSummary, Location, PhaseId, PlanDay,
    PlanWeek, PlannedSession, PlanningPrefs, ProfileSnapshot, Slot, SlotAvailability,
    WeekAvailability, WeekPlan, WeekTargets, Weekday, PLAN_VERSION,
};
use tracing::{debug, info};

use crate::config::PlanningConfig;
use crate::macrocycle::{apply_deload_week, WeekContext};
use crate::training_constants::{phases, sessions};
use sessions::SessionMeta;

pub use availability::{apply_availability_change, normalize_availability};

/// Locations used when the caller restricts none
pub const DEFAULT_LOCATIONS: [Location; 2] = [Location::Gym, Location::Home];

/// Slot order for primary and test sessions
const PRIMARY_SLOT_ORDER: [Slot; 3] = [Slot::Evening, Slot::Morning, Slot::Lunch];
/// Slot order for complementary sessions
const COMPLEMENTARY_SLOT_ORDER: [Slot; 3] = [Slot::Lunch, Slot::Morning, Slot::Evening];

const PASS_PRIMARY: &str = "pass1:primary";
const PASS_COMPLEMENTARY: &str = "pass2:complementary";
const PASS_FINGER_MAINTENANCE: &str = "pass2.5:finger_maintenance";
const PASS_TEST: &str = "pass3:test_session";

/// Inputs of [`plan_week`]
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    /// Phase of the week
    pub phase_id: PhaseId,
    /// Phase domain weights, copied into the snapshot
    pub domain_weights: &'a DomainWeights,
    /// Ordered session pool of the phase
    pub session_pool: &'a [String],
    /// Monday of the week
    pub start_date: NaiveDate,
    /// Normalized availability
    pub availability: &'a WeekAvailability,
    /// Locations the planner may use
    pub allowed_locations: &'a [Location],
    /// Weekly hard-day cap before preferences
    pub hard_cap_per_week: u32,
    /// Planning preferences
    pub planning_prefs: &'a PlanningPrefs,
    /// Gym used when a slot names none
    pub default_gym_id: Option<&'a str>,
    /// Known gyms
    pub gyms: &'a [Gym],
    /// Phase intensity cap, defaulting to the phase table
    pub intensity_cap: Option<Intensity>,
    /// Days that may not hold a hard session
    pub pretrip_dates: &'a [NaiveDate],
    /// Last week of the phase, where benchmark tests go
    pub is_last_week_of_phase: bool,
}

impl<'a> PlanRequest<'a> {
    /// Request for a macrocycle week with the default location set
    #[must_use]
    pub fn from_context(
        context: &'a WeekContext,
        availability: &'a WeekAvailability,
        planning_prefs: &'a PlanningPrefs,
        gyms: &'a [Gym],
        default_gym_id: Option<&'a str>,
    ) -> Self {
        let hard_cap = planning_prefs
            .hard_day_cap_per_week
            .unwrap_or(PlanningConfig::global().planner.default_hard_cap);
        Self {
            phase_id: context.phase_id,
            domain_weights: &context.domain_weights,
            session_pool: &context.session_pool,
            start_date: context.start_date,
            availability,
            allowed_locations: &DEFAULT_LOCATIONS,
            hard_cap_per_week: hard_cap,
            planning_prefs,
            default_gym_id,
            gyms,
            intensity_cap: Some(context.intensity_cap),
            pretrip_dates: &context.pretrip_dates,
            is_last_week_of_phase: context.is_last_week_of_phase,
        }
    }
}

// ============================================================================
// Placement helpers
// ============================================================================

/// Location for a session in a slot: the preferred one when viable,
/// none when a preference exists but is not viable, else the first viable
#[must_use]
pub fn pick_location(
    meta: &SessionMeta,
    slot: &SlotAvailability,
    allowed: &[Location],
) -> Option<Location> {
    let slot_locations = if slot.locations.is_empty() {
        allowed
    } else {
        slot.locations.as_slice()
    };
    let mut viable: Vec<Location> = slot_locations
        .iter()
        .copied()
        .filter(|l| meta.allows(*l) && allowed.contains(l))
        .collect();
    viable.sort();
    viable.dedup();
    match slot.preferred_location {
        Some(preferred) => viable.contains(&preferred).then_some(preferred),
        None => viable.first().copied(),
    }
}

/// Gym for a gym session: slot gym, then the default gym, then the first gym by priority
#[must_use]
pub fn select_gym_id(
    slot_gym: Option<&str>,
    default_gym_id: Option<&str>,
    gyms: &[Gym],
) -> Option<String> {
    slot_gym
        .filter(|g| !g.is_empty())
        .or_else(|| default_gym_id.filter(|g| !g.is_empty()))
        .map(str::to_owned)
        .or_else(|| {
            gyms.iter()
                .filter(|g| !g.gym_id.is_empty())
                .min_by(|a, b| a.sort_key().cmp(&b.sort_key()))
                .map(|g| g.gym_id.clone())
        })
}

/// Build a planned session from the metadata table
#[must_use]
pub fn planned_session(
    session_id: &str,
    slot: Slot,
    location: Location,
    gym_id: Option<String>,
    phase_id: PhaseId,
) -> PlannedSession {
    let meta = sessions::lookup_or_default(session_id);
    PlannedSession {
        slot,
        session_id: session_id.to_owned(),
        location,
        gym_id: if location == Location::Gym { gym_id } else { None },
        phase_id,
        intensity: meta.intensity,
        estimated_load_score: meta.intensity.load_score(),
        tags: meta.tags(),
        constraints_applied: Vec::new(),
        explain: Vec::new(),
        status: None,
        resolved: None,
    }
}

/// Weekly load totals of a set of days
#[must_use]
pub fn load_summary(days: &[PlanDay]) -> LoadSummary {
    let total_load = days
        .iter()
        .flat_map(|d| &d.sessions)
        .map(|s| s.estimated_load_score)
        .sum();
    let hard_days_count = days.iter().filter(|d| d.has_hard()).count() as u32;
    let recovery_days_count = days
        .iter()
        .filter(|d| d.sessions.iter().all(|s| s.intensity == Intensity::Low))
        .count() as u32;
    LoadSummary {
        total_load,
        hard_days_count,
        recovery_days_count,
    }
}

/// Mutable planning state for one week
struct WeekBuilder<'r, 'a> {
    request: &'r PlanRequest<'a>,
    allowed: Vec<Location>,
    dates: [NaiveDate; 7],
    sessions: [Vec<PlannedSession>; 7],
    eligible: [bool; 7],
    outdoor_slot: [bool; 7],
    hard_cap: u32,
    hard_days: u32,
    finger_offsets: Vec<usize>,
    hard_offsets: Vec<usize>,
    max_offsets: Vec<usize>,
}

fn near(offsets: &[usize], offset: usize) -> bool {
    offsets.iter().any(|o| o.abs_diff(offset) <= 1)
}

impl<'r, 'a> WeekBuilder<'r, 'a> {
    fn new(request: &'r PlanRequest<'a>, hard_cap: u32) -> Self {
        let mut allowed = if request.allowed_locations.is_empty() {
            DEFAULT_LOCATIONS.to_vec()
        } else {
            request.allowed_locations.to_vec()
        };
        allowed.sort();
        allowed.dedup();
        let dates: [NaiveDate; 7] =
            std::array::from_fn(|i| add_days(request.start_date, i as i64));
        Self {
            request,
            allowed,
            dates,
            sessions: Default::default(),
            eligible: [false; 7],
            outdoor_slot: [false; 7],
            hard_cap,
            hard_days: 0,
            finger_offsets: Vec::new(),
            hard_offsets: Vec::new(),
            max_offsets: Vec::new(),
        }
    }

    fn weekday(&self, offset: usize) -> Weekday {
        Weekday::from_date(self.dates[offset])
    }

    fn slot(&self, offset: usize, slot: Slot) -> Option<&SlotAvailability> {
        self.request.availability.slot(self.weekday(offset), slot)
    }

    fn is_pretrip(&self, offset: usize) -> bool {
        self.request.pretrip_dates.contains(&self.dates[offset])
    }

    fn slot_taken(&self, offset: usize, slot: Slot) -> bool {
        self.sessions[offset].iter().any(|s| s.slot == slot)
    }

    /// Mark eligible days, flag outdoor-only days, and cap to the day quota
    fn select_days(&mut self, target_days: usize) {
        for offset in 0..7 {
            let weekday = self.weekday(offset);
            let open: Vec<&SlotAvailability> = Slot::ALL
                .iter()
                .filter_map(|s| self.request.availability.slot(weekday, *s))
                .filter(|s| s.available)
                .collect();
            if open.iter().any(|s| s.is_outdoor_only()) {
                self.outdoor_slot[offset] = true;
                continue;
            }
            self.eligible[offset] = !open.is_empty();
        }

        let eligible_count = self.eligible.iter().filter(|e| **e).count();
        if eligible_count <= target_days {
            return;
        }

        let mut scored: Vec<(u32, usize)> = (0..7)
            .filter(|o| self.eligible[*o])
            .map(|offset| (self.day_score(offset), offset))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let keep: Vec<usize> = scored.iter().take(target_days).map(|(_, o)| *o).collect();
        for offset in 0..7 {
            if !keep.contains(&offset) {
                self.eligible[offset] = false;
            }
        }
        debug!(?keep, "training days capped to quota");
    }

    fn day_score(&self, offset: usize) -> u32 {
        Slot::ALL
            .iter()
            .filter_map(|s| self.slot(offset, *s).map(|info| (*s, info)))
            .filter(|(_, info)| info.available)
            .map(|(slot, info)| {
                let base = if info.prefers_gym() {
                    100
                } else if info.locations.contains(&Location::Gym) {
                    50
                } else {
                    1
                };
                if slot == Slot::Evening {
                    base + 10
                } else {
                    base
                }
            })
            .sum()
    }

    fn day_has_gym(&self, offset: usize) -> bool {
        Slot::ALL.iter().any(|s| {
            self.slot(offset, *s).is_some_and(|info| {
                info.available
                    && (info.preferred_location == Some(Location::Gym)
                        || info.locations.contains(&Location::Gym))
            })
        })
    }

    /// First open, free slot in `order` where the session has a viable location
    fn find_slot(&self, offset: usize, meta: &SessionMeta, order: &[Slot]) -> Option<(Slot, Location)> {
        order.iter().find_map(|slot| {
            if self.slot_taken(offset, *slot) {
                return None;
            }
            let info = self.slot(offset, *slot).filter(|i| i.available)?;
            pick_location(meta, info, &self.allowed).map(|loc| (*slot, loc))
        })
    }

    fn make_entry(&self, offset: usize, session_id: &str, slot: Slot, location: Location, reason: &str) -> PlannedSession {
        let slot_gym = self.slot(offset, slot).and_then(|s| s.gym_id.as_deref());
        let gym_id = (location == Location::Gym)
            .then(|| select_gym_id(slot_gym, self.request.default_gym_id, self.request.gyms))
            .flatten();
        let mut entry = planned_session(session_id, slot, location, gym_id, self.request.phase_id);
        entry.explain.push(ExplainEntry {
            phase: Some(self.request.phase_id),
            slot: Some(slot),
            weekday: Some(self.weekday(offset)),
            reason: reason.to_owned(),
        });
        entry
    }

    fn record(&mut self, offset: usize, meta: &SessionMeta) {
        if meta.hard && !self.hard_offsets.contains(&offset) {
            self.hard_days += 1;
            self.hard_offsets.push(offset);
        }
        if meta.finger && !self.finger_offsets.contains(&offset) {
            self.finger_offsets.push(offset);
        }
        if meta.intensity == Intensity::Max && !self.max_offsets.contains(&offset) {
            self.max_offsets.push(offset);
        }
    }

    fn rejects(&self, offset: usize, session_id: &str, meta: &SessionMeta) -> Option<&'static str> {
        if self.is_pretrip(offset) && (meta.hard || meta.intensity == Intensity::Max) {
            return Some("pretrip_deload");
        }
        if meta.hard && self.hard_days >= self.hard_cap {
            return Some("hard_cap");
        }
        if meta.finger && near(&self.finger_offsets, offset) {
            return Some("finger_spacing");
        }
        if meta.hard && near(&self.hard_offsets, offset) {
            return Some("hard_spacing");
        }
        if meta.intensity == Intensity::Max && near(&self.max_offsets, offset) {
            return Some("max_spacing");
        }
        debug!(session_id, offset, "candidate passes constraints");
        None
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    fn place_primary(&mut self, pool: &[(&str, SessionMeta)]) {
        if pool.is_empty() {
            return;
        }
        let max_uses = pool.len() * 2;
        let mut idx = 0_usize;
        let mut uses = 0_usize;

        let mut order: Vec<usize> = (0..7).filter(|o| self.eligible[*o]).collect();
        order.sort_by_key(|o| (!self.day_has_gym(*o), *o));

        for offset in order {
            if uses >= max_uses {
                break;
            }
            let mut attempts = 0;
            while attempts < pool.len() && uses < max_uses {
                let (session_id, meta) = pool[idx % pool.len()];
                idx += 1;
                uses += 1;
                attempts += 1;

                if let Some(rule) = self.rejects(offset, session_id, &meta) {
                    debug!(session_id, offset, rule, "primary candidate rejected");
                    continue;
                }
                let Some((slot, location)) = self.find_slot(offset, &meta, &PRIMARY_SLOT_ORDER)
                else {
                    continue;
                };
                let entry = self.make_entry(offset, session_id, slot, location, PASS_PRIMARY);
                self.sessions[offset].push(entry);
                self.record(offset, &meta);
                break;
            }
        }
    }

    fn place_complementary(&mut self, pool: &[(&str, SessionMeta)], target_days: usize) {
        if pool.is_empty() {
            return;
        }
        let max_uses = pool.len() * 2;
        let mut idx = 0_usize;
        let mut uses = 0_usize;
        let mut days_with_sessions = self.sessions.iter().filter(|s| !s.is_empty()).count();

        for offset in 0..7 {
            if days_with_sessions >= target_days || uses >= max_uses {
                break;
            }
            if !self.sessions[offset].is_empty() || !self.eligible[offset] {
                continue;
            }
            let mut attempts = 0;
            while attempts < pool.len() && uses < max_uses {
                let (session_id, meta) = pool[idx % pool.len()];
                idx += 1;
                uses += 1;
                attempts += 1;

                let Some((slot, location)) =
                    self.find_slot(offset, &meta, &COMPLEMENTARY_SLOT_ORDER)
                else {
                    continue;
                };
                let entry = self.make_entry(offset, session_id, slot, location, PASS_COMPLEMENTARY);
                self.sessions[offset].push(entry);
                self.record(offset, &meta);
                days_with_sessions += 1;
                break;
            }
        }
    }

    fn place_finger_maintenance(&mut self, target_days: usize, max_per_day: usize) {
        let already = self
            .sessions
            .iter()
            .flatten()
            .any(|s| s.session_id == sessions::FINGER_MAINTENANCE);
        if already {
            return;
        }
        let Some(meta) = sessions::lookup(sessions::FINGER_MAINTENANCE) else {
            return;
        };
        let days_with_sessions = self.sessions.iter().filter(|s| !s.is_empty()).count();

        // Days already training first, so the quota is not exceeded
        let mut order: Vec<usize> = (0..7).filter(|o| self.eligible[*o]).collect();
        order.sort_by_key(|o| (self.sessions[*o].is_empty(), *o));

        for offset in order {
            let count = self.sessions[offset].len();
            if count >= max_per_day || (count == 0 && days_with_sessions >= target_days) {
                continue;
            }
            if near(&self.finger_offsets, offset) {
                continue;
            }
            let Some((slot, location)) = self.find_slot(offset, &meta, &COMPLEMENTARY_SLOT_ORDER)
            else {
                continue;
            };
            let entry = self.make_entry(
                offset,
                sessions::FINGER_MAINTENANCE,
                slot,
                location,
                PASS_FINGER_MAINTENANCE,
            );
            self.sessions[offset].push(entry);
            self.record(offset, &meta);
            return;
        }
        debug!("no day satisfies finger spacing for maintenance session");
    }

    fn place_tests(&mut self, cap: Intensity) {
        let mut used_days: Vec<usize> = Vec::new();
        for test_id in sessions::TEST_SESSIONS {
            let Some(meta) = sessions::lookup(test_id) else {
                continue;
            };
            if meta.intensity > cap {
                continue;
            }
            for offset in 0..7 {
                if used_days.contains(&offset) || self.sessions[offset].is_empty() {
                    continue;
                }
                if self.is_pretrip(offset) && meta.hard {
                    continue;
                }
                let day_finger = self.sessions[offset].iter().any(|s| s.tags.finger);
                let day_hard = self.sessions[offset].iter().any(|s| s.tags.hard);
                if meta.finger && !day_finger && near(&self.finger_offsets, offset) {
                    continue;
                }
                if meta.hard && !day_hard && near(&self.hard_offsets, offset) {
                    continue;
                }
                if meta.hard && !day_hard && self.hard_days >= self.hard_cap {
                    continue;
                }

                // Replace a complementary session first, else the last one
                let replace_idx = self.sessions[offset]
                    .iter()
                    .position(|s| {
                        let m = sessions::lookup_or_default(&s.session_id);
                        !(m.hard || m.climbing)
                    })
                    .unwrap_or(self.sessions[offset].len() - 1);
                let replaced_slot = self.sessions[offset][replace_idx].slot;

                let same_slot = self
                    .slot(offset, replaced_slot)
                    .filter(|i| i.available)
                    .and_then(|info| pick_location(&meta, info, &self.allowed))
                    .map(|loc| (replaced_slot, loc));
                let Some((slot, location)) = same_slot.or_else(|| {
                    let taken: Vec<Slot> = self.sessions[offset]
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != replace_idx)
                        .map(|(_, s)| s.slot)
                        .collect();
                    PRIMARY_SLOT_ORDER.iter().find_map(|s| {
                        if taken.contains(s) {
                            return None;
                        }
                        let info = self.slot(offset, *s).filter(|i| i.available)?;
                        pick_location(&meta, info, &self.allowed).map(|loc| (*s, loc))
                    })
                }) else {
                    continue;
                };

                let entry = self.make_entry(offset, test_id, slot, location, PASS_TEST);
                self.sessions[offset][replace_idx] = entry;
                self.record(offset, &meta);
                used_days.push(offset);
                break;
            }
        }
    }

    fn finish(self, cap: Intensity) -> WeekPlan {
        let request = self.request;
        let mut days: Vec<PlanDay> = Vec::with_capacity(7);
        for (offset, mut day_sessions) in self.sessions.into_iter().enumerate() {
            day_sessions.sort_by(|a, b| (a.slot, &a.session_id).cmp(&(b.slot, &b.session_id)));
            days.push(PlanDay {
                date: self.dates[offset],
                weekday: Weekday::from_date(self.dates[offset]),
                sessions: day_sessions,
                status: None,
                outdoor_slot: self.outdoor_slot[offset],
                pretrip_deload: request.pretrip_dates.contains(&self.dates[offset]),
            });
        }
        let finger_days = days.iter().filter(|d| d.has_finger()).count() as u32;
        let is_deload = request.phase_id == PhaseId::Deload;

        let mut plan = WeekPlan {
            plan_version: PLAN_VERSION.to_owned(),
            generated_at: now_timestamp(),
            start_date: request.start_date,
            profile_snapshot: ProfileSnapshot {
                phase_id: request.phase_id,
                domain_weights: request.domain_weights.clone(),
                intensity_cap: cap,
                allowed_locations: self.allowed,
                hard_cap_per_week: self.hard_cap,
                planning_prefs: request.planning_prefs.clone(),
            },
            weekly_load_summary: load_summary(&days),
            weeks: vec![PlanWeek {
                week_index: 1,
                phase: request.phase_id,
                targets: WeekTargets {
                    hard_days: self.hard_cap,
                    finger_days,
                    deload_factor: if is_deload { 0.5 } else { 1.0 },
                },
                days,
            }],
            adaptations: Vec::new(),
            plan_revision: 1,
        };

        if is_deload {
            apply_deload_week(&mut plan);
            plan.weekly_load_summary = load_summary(plan.days());
        }
        plan
    }
}

/// Generate one week plan inside a phase
#[must_use]
pub fn plan_week(request: &PlanRequest<'_>) -> WeekPlan {
    let config = &PlanningConfig::global().planner;
    let cap = request
        .intensity_cap
        .unwrap_or_else(|| phases::intensity_cap(request.phase_id));

    let mut hard_cap = request
        .planning_prefs
        .hard_day_cap_per_week
        .map_or(request.hard_cap_per_week, |p| p.min(request.hard_cap_per_week));
    if request.phase_id == PhaseId::Deload {
        hard_cap = 0;
    }
    let target_days = request
        .planning_prefs
        .target_training_days_per_week
        .unwrap_or(config.target_training_days) as usize;

    let filtered: Vec<(&str, SessionMeta)> = request
        .session_pool
        .iter()
        .filter_map(|id| sessions::lookup(id).map(|meta| (id.as_str(), meta)))
        .filter(|(_, meta)| meta.intensity <= cap)
        .collect();
    let (primary, complementary): (Vec<_>, Vec<_>) = filtered
        .into_iter()
        .partition(|(_, meta)| meta.hard || meta.climbing);

    let mut builder = WeekBuilder::new(request, hard_cap);
    builder.select_days(target_days);
    builder.place_primary(&primary);
    builder.place_complementary(&complementary, target_days);
    if request.phase_id == PhaseId::PowerEndurance {
        builder.place_finger_maintenance(target_days, config.max_sessions_per_day);
    }
    if request.is_last_week_of_phase
        && matches!(request.phase_id, PhaseId::Base | PhaseId::StrengthPower)
    {
        builder.place_tests(cap);
    }

    let plan = builder.finish(cap);
    info!(
        phase = %request.phase_id,
        start_date = %request.start_date,
        total_load = plan.weekly_load_summary.total_load,
        hard_days = plan.weekly_load_summary.hard_days_count,
        "week planned"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macrocycle::session_pool;
    use crux_core::dates::parse_date;
    use crux_core::models::AvailabilityInput;
    use serde_json::json;

    fn d(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    fn week(value: serde_json::Value) -> WeekAvailability {
        let input: AvailabilityInput = serde_json::from_value(value).unwrap();
        normalize_availability(&input, &DEFAULT_LOCATIONS)
    }

    fn plan(phase: PhaseId, availability: &WeekAvailability, prefs: &PlanningPrefs) -> WeekPlan {
        plan_with(phase, availability, prefs, &[], false)
    }

    fn plan_with(
        phase: PhaseId,
        availability: &WeekAvailability,
        prefs: &PlanningPrefs,
        pretrip: &[NaiveDate],
        last_week: bool,
    ) -> WeekPlan {
        let pool = session_pool(phase);
        let weights = phases::base_weights(phase);
        let gyms = vec![Gym {
            gym_id: "blocx".into(),
            priority: Some(1),
            ..Gym::default()
        }];
        plan_week(&PlanRequest {
            phase_id: phase,
            domain_weights: &weights,
            session_pool: &pool,
            start_date: d("2026-03-02"),
            availability,
            allowed_locations: &DEFAULT_LOCATIONS,
            hard_cap_per_week: 3,
            planning_prefs: prefs,
            default_gym_id: None,
            gyms: &gyms,
            intensity_cap: None,
            pretrip_dates: pretrip,
            is_last_week_of_phase: last_week,
        })
    }

    fn all_open() -> WeekAvailability {
        normalize_availability(&AvailabilityInput::new(), &DEFAULT_LOCATIONS)
    }

    #[test]
    fn test_single_home_evening_gives_one_day() {
        let availability = week(json!({"mon": {"evening": {"locations": ["home"]}}}));
        let plan = plan(PhaseId::Base, &availability, &PlanningPrefs::default());
        let trained: Vec<&PlanDay> = plan.days().iter().filter(|d| !d.sessions.is_empty()).collect();
        assert_eq!(trained.len(), 1);
        assert_eq!(trained[0].weekday, Weekday::Mon);
        assert_eq!(trained[0].sessions.len(), 1);
        assert!(plan.days().iter().all(|d| !d.outdoor_slot));
    }

    #[test]
    fn test_constraints_hold_in_strength_phase() {
        let plan = plan(PhaseId::StrengthPower, &all_open(), &PlanningPrefs::default());
        let days = plan.days();
        let trained = days.iter().filter(|d| !d.sessions.is_empty()).count();
        assert!(trained <= 4);
        assert!(plan.weekly_load_summary.hard_days_count <= 3);
        for pair in days.windows(2) {
            assert!(!(pair[0].has_finger() && pair[1].has_finger()));
            assert!(!(pair[0].has_hard() && pair[1].has_hard()));
        }
    }

    #[test]
    fn test_intensity_cap_filters_pool() {
        let plan = plan(PhaseId::Base, &all_open(), &PlanningPrefs::default());
        assert!(plan
            .days()
            .iter()
            .flat_map(|d| &d.sessions)
            .all(|s| s.intensity <= Intensity::Medium));
    }

    #[test]
    fn test_deload_has_no_hard_and_three_sessions_max() {
        let plan = plan(PhaseId::Deload, &all_open(), &PlanningPrefs::default());
        let sessions: Vec<&PlannedSession> = plan.days().iter().flat_map(|d| &d.sessions).collect();
        assert!(sessions.len() <= 3);
        assert!(sessions.iter().all(|s| !s.tags.hard));
        assert!((plan.weeks[0].targets.deload_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(plan.profile_snapshot.hard_cap_per_week, 0);
    }

    #[test]
    fn test_pretrip_days_carry_no_hard_sessions() {
        let pretrip = [d("2026-03-02"), d("2026-03-03"), d("2026-03-04")];
        let plan = plan_with(PhaseId::StrengthPower, &all_open(), &PlanningPrefs::default(), &pretrip, false);
        for day in plan.days().iter().filter(|d| pretrip.contains(&d.date)) {
            assert!(day.pretrip_deload);
            assert!(!day.has_hard());
        }
    }

    #[test]
    fn test_outdoor_only_day_is_flagged_and_empty() {
        let availability = week(json!({
            "sat": {"morning": {"locations": ["outdoor"]}},
            "tue": {"evening": true}
        }));
        let plan = plan(PhaseId::Base, &availability, &PlanningPrefs::default());
        let saturday = plan.day(d("2026-03-07")).unwrap();
        assert!(saturday.outdoor_slot);
        assert!(saturday.sessions.is_empty());
        assert!(!plan.day(d("2026-03-03")).unwrap().sessions.is_empty());
    }

    #[test]
    fn test_power_endurance_week_gets_finger_maintenance() {
        let plan = plan(PhaseId::PowerEndurance, &all_open(), &PlanningPrefs::default());
        let maintenance: Vec<&PlannedSession> = plan
            .days()
            .iter()
            .flat_map(|d| &d.sessions)
            .filter(|s| s.session_id == sessions::FINGER_MAINTENANCE)
            .collect();
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].location, Location::Home);
        assert_eq!(maintenance[0].explain[0].reason, PASS_FINGER_MAINTENANCE);
    }

    #[test]
    fn test_last_strength_week_places_a_test() {
        let prefs = PlanningPrefs {
            hard_day_cap_per_week: Some(3),
            target_training_days_per_week: Some(5),
            default_gym_id: None,
        };
        let plan = plan_with(PhaseId::StrengthPower, &all_open(), &prefs, &[], true);
        assert!(plan
            .days()
            .iter()
            .flat_map(|d| &d.sessions)
            .any(|s| s.session_id.starts_with("test_")));
        assert!(plan.weekly_load_summary.hard_days_count <= 3);
    }

    #[test]
    fn test_gym_sessions_get_a_gym_id() {
        let plan = plan(PhaseId::StrengthPower, &all_open(), &PlanningPrefs::default());
        for session in plan.days().iter().flat_map(|d| &d.sessions) {
            if session.location == Location::Gym {
                assert_eq!(session.gym_id.as_deref(), Some("blocx"));
            } else {
                assert!(session.gym_id.is_none());
            }
        }
    }

    #[test]
    fn test_pick_location_respects_preference() {
        let meta = sessions::lookup("strength_long").unwrap();
        let slot = SlotAvailability {
            available: true,
            locations: vec![Location::Gym, Location::Home],
            preferred_location: Some(Location::Home),
            gym_id: None,
        };
        assert_eq!(pick_location(&meta, &slot, &DEFAULT_LOCATIONS), Some(Location::Home));
        let gym_only = sessions::lookup("power_contact_gym").unwrap();
        assert_eq!(pick_location(&gym_only, &slot, &DEFAULT_LOCATIONS), None);
    }
}
