// ABOUTME: Weekly availability as entered by the user and in its normalized per-slot form
// ABOUTME: Raw days may be absent, disabled, or carry per-slot booleans or detail records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use super::common::{Location, Slot, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Detailed slot entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetail {
    /// Whether the slot can hold a session (defaults to true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    /// Locations reachable in this slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    /// Location to use when several are viable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_location: Option<Location>,
    /// Gym to use for gym sessions in this slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<String>,
}

/// A slot value: either a bare flag or a detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotInput {
    /// `true` / `false`
    Flag(bool),
    /// `{available, locations, preferred_location, gym_id}`
    Detail(SlotDetail),
}

/// One weekday as entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailabilityInput {
    /// `false` disables every slot of the day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    /// Morning slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<SlotInput>,
    /// Lunch slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<SlotInput>,
    /// Evening slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<SlotInput>,
}

impl DayAvailabilityInput {
    /// Slot entry as entered
    #[must_use]
    pub const fn slot(&self, slot: Slot) -> Option<&SlotInput> {
        match slot {
            Slot::Morning => self.morning.as_ref(),
            Slot::Lunch => self.lunch.as_ref(),
            Slot::Evening => self.evening.as_ref(),
        }
    }

    /// Mutable slot entry as entered
    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<SlotInput> {
        match slot {
            Slot::Morning => &mut self.morning,
            Slot::Lunch => &mut self.lunch,
            Slot::Evening => &mut self.evening,
        }
    }

    /// Whether any slot key is present
    #[must_use]
    pub fn has_explicit_slots(&self) -> bool {
        Slot::ALL.iter().any(|s| self.slot(*s).is_some())
    }
}

/// Availability keyed by weekday, as stored in user state
pub type AvailabilityInput = BTreeMap<Weekday, DayAvailabilityInput>;

/// A slot after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// Whether the slot can hold a session
    pub available: bool,
    /// Sorted reachable locations
    pub locations: Vec<Location>,
    /// Preferred location, if any
    pub preferred_location: Option<Location>,
    /// Slot-specific gym
    pub gym_id: Option<String>,
}

impl SlotAvailability {
    /// Whether the only reachable location is outdoors
    #[must_use]
    pub fn is_outdoor_only(&self) -> bool {
        self.available && self.locations == [Location::Outdoor]
    }

    /// Whether the slot leans towards the gym
    #[must_use]
    pub fn prefers_gym(&self) -> bool {
        self.preferred_location == Some(Location::Gym)
            || (self.preferred_location.is_none() && self.locations.contains(&Location::Gym))
    }
}

/// Normalized availability for a full week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekAvailability {
    days: BTreeMap<Weekday, BTreeMap<Slot, SlotAvailability>>,
}

impl WeekAvailability {
    /// Build from fully populated days
    #[must_use]
    pub const fn new(days: BTreeMap<Weekday, BTreeMap<Slot, SlotAvailability>>) -> Self {
        Self { days }
    }

    /// Normalized slot
    #[must_use]
    pub fn slot(&self, weekday: Weekday, slot: Slot) -> Option<&SlotAvailability> {
        self.days.get(&weekday).and_then(|d| d.get(&slot))
    }

    /// Mutable normalized slot
    pub fn slot_mut(&mut self, weekday: Weekday, slot: Slot) -> Option<&mut SlotAvailability> {
        self.days.get_mut(&weekday).and_then(|d| d.get_mut(&slot))
    }

    /// Whether any slot of the day is available
    #[must_use]
    pub fn day_has_slot(&self, weekday: Weekday) -> bool {
        self.days
            .get(&weekday)
            .is_some_and(|d| d.values().any(|s| s.available))
    }
}
