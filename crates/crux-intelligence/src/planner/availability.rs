// ABOUTME: Normalizes user-entered weekly availability into a fully populated per-slot grid
// ABOUTME: Applies single-slot availability changes from replanner events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_core::models::{
    AvailabilityChange, AvailabilityInput, DayAvailabilityInput, Location, Slot, SlotAvailability,
    SlotInput, WeekAvailability, Weekday,
};
use std::collections::BTreeMap;

fn default_slot(allowed: &[Location], available: bool) -> SlotAvailability {
    SlotAvailability {
        available,
        locations: allowed.to_vec(),
        preferred_location: None,
        gym_id: None,
    }
}

fn normalize_slot(input: Option<&SlotInput>, allowed: &[Location], explicit: bool) -> SlotAvailability {
    match input {
        None => default_slot(allowed, !explicit),
        Some(SlotInput::Flag(flag)) => default_slot(allowed, *flag),
        Some(SlotInput::Detail(detail)) => {
            let mut slot = default_slot(allowed, detail.available.unwrap_or(true));
            if let Some(locations) = &detail.locations {
                let mut sorted = locations.clone();
                sorted.sort();
                sorted.dedup();
                slot.locations = sorted;
            }
            slot.preferred_location = detail.preferred_location;
            slot.gym_id = detail.gym_id.clone().filter(|g| !g.is_empty());
            slot
        }
    }
}

fn normalize_day(day: &DayAvailabilityInput, allowed: &[Location]) -> BTreeMap<Slot, SlotAvailability> {
    let disabled = day.available == Some(false);
    let explicit = day.has_explicit_slots();
    Slot::ALL
        .iter()
        .map(|slot| {
            let normalized = if disabled {
                default_slot(allowed, false)
            } else {
                normalize_slot(day.slot(*slot), allowed, explicit)
            };
            (*slot, normalized)
        })
        .collect()
}

/// Normalize availability to every weekday and slot
///
/// An empty map means the user gave no constraints and every slot is open.
/// Once any weekday is listed, unlisted weekdays are closed. Inside a day,
/// naming any slot closes the unnamed ones, and an empty day opens all three.
#[must_use]
pub fn normalize_availability(input: &AvailabilityInput, allowed: &[Location]) -> WeekAvailability {
    let mut allowed_sorted = allowed.to_vec();
    allowed_sorted.sort();
    allowed_sorted.dedup();

    let open_day = DayAvailabilityInput::default();
    let closed_day = DayAvailabilityInput {
        available: Some(false),
        ..DayAvailabilityInput::default()
    };
    let absent = if input.is_empty() { &open_day } else { &closed_day };

    let days = Weekday::ALL
        .iter()
        .map(|weekday| {
            let day = input.get(weekday).unwrap_or(absent);
            (*weekday, normalize_day(day, &allowed_sorted))
        })
        .collect();
    WeekAvailability::new(days)
}

/// Apply a partial slot update to normalized availability
///
/// Only the fields the change carries are written.
pub fn apply_availability_change(
    availability: &mut WeekAvailability,
    weekday: Weekday,
    change: &AvailabilityChange,
) {
    let Some(slot) = availability.slot_mut(weekday, change.slot) else {
        return;
    };
    if let Some(available) = change.available {
        slot.available = available;
    }
    if let Some(locations) = &change.locations {
        let mut sorted = locations.clone();
        sorted.sort();
        sorted.dedup();
        slot.locations = sorted;
    }
    if change.preferred_location.is_some() {
        slot.preferred_location = change.preferred_location;
    }
    if let Some(gym_id) = &change.gym_id {
        slot.gym_id = Some(gym_id.clone()).filter(|g| !g.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: [Location; 2] = [Location::Home, Location::Gym];

    fn parse(value: serde_json::Value) -> AvailabilityInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_map_opens_everything() {
        let week = normalize_availability(&AvailabilityInput::new(), &ALLOWED);
        for weekday in Weekday::ALL {
            assert!(week.day_has_slot(weekday));
        }
        let slot = week.slot(Weekday::Mon, Slot::Lunch).unwrap();
        assert_eq!(slot.locations, vec![Location::Gym, Location::Home]);
    }

    #[test]
    fn test_explicit_slots_close_the_rest() {
        let week = normalize_availability(
            &parse(json!({"mon": {"evening": {"preferred_location": "home", "locations": ["home"]}}})),
            &ALLOWED,
        );
        let evening = week.slot(Weekday::Mon, Slot::Evening).unwrap();
        assert!(evening.available);
        assert_eq!(evening.preferred_location, Some(Location::Home));
        assert!(!week.slot(Weekday::Mon, Slot::Morning).unwrap().available);
        assert!(!week.day_has_slot(Weekday::Tue));
    }

    #[test]
    fn test_empty_day_and_disabled_day() {
        let week = normalize_availability(
            &parse(json!({"wed": {}, "thu": {"available": false, "evening": true}, "fri": {"lunch": false, "evening": true}})),
            &ALLOWED,
        );
        assert!(Slot::ALL
            .iter()
            .all(|s| week.slot(Weekday::Wed, *s).unwrap().available));
        assert!(!week.day_has_slot(Weekday::Thu));
        assert!(!week.slot(Weekday::Fri, Slot::Lunch).unwrap().available);
        assert!(!week.slot(Weekday::Fri, Slot::Morning).unwrap().available);
        assert!(week.slot(Weekday::Fri, Slot::Evening).unwrap().available);
    }

    #[test]
    fn test_change_updates_only_given_fields() {
        let mut week = normalize_availability(&AvailabilityInput::new(), &ALLOWED);
        apply_availability_change(
            &mut week,
            Weekday::Tue,
            &AvailabilityChange {
                weekday: None,
                slot: Slot::Evening,
                available: Some(false),
                locations: None,
                preferred_location: None,
                gym_id: None,
            },
        );
        let slot = week.slot(Weekday::Tue, Slot::Evening).unwrap();
        assert!(!slot.available);
        assert_eq!(slot.locations.len(), 2);
    }
}
