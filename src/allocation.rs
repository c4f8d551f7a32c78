//! Per-product allocation state: the deduplicated serial working set and the
//! mapping from each destination to its assigned subset.
//!
//! Two invariants hold after every operation:
//!
//! 1. a serial appears in at most one destination's sequence;
//! 2. every assigned serial is present in the working set.
//!
//! Manual reassignment rebuilds the whole mapping from the declared
//! (serial → destination-or-none) choice set instead of patching it in
//! place, so the invariants survive out-of-order grid events.

use std::collections::{HashMap, HashSet};

use crate::types::{AllocationCounts, Destination, DestinationCount, DestinationId, QuotaStanding};

/// Allocation state for one product line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationState {
    destinations: Vec<Destination>,
    serials: Vec<String>,
    assignments: HashMap<DestinationId, Vec<String>>,
}

impl AllocationState {
    /// Creates an empty state with a fixed, ordered destination list.
    ///
    /// Destination ids must be unique; a repeated id keeps its first
    /// occurrence and later repeats are dropped, since they would all alias
    /// one assignment sequence.
    pub fn new(destinations: Vec<Destination>) -> Self {
        let mut seen: HashSet<DestinationId> = HashSet::with_capacity(destinations.len());
        let destinations: Vec<Destination> = destinations
            .into_iter()
            .filter(|d| seen.insert(d.id))
            .collect();
        let assignments = destinations.iter().map(|d| (d.id, Vec::new())).collect();
        Self {
            destinations,
            serials: Vec::new(),
            assignments,
        }
    }

    /// The fixed destination list, in auto-assignment priority order.
    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// The current deduplicated working set, insertion order preserved.
    pub fn serials(&self) -> &[String] {
        &self.serials
    }

    /// Serials currently assigned to a destination, in assignment order.
    /// Unknown destination ids yield an empty slice.
    pub fn assigned(&self, destination_id: DestinationId) -> &[String] {
        self.assignments
            .get(&destination_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replaces the working set and clears every assignment sequence.
    ///
    /// Prior manual assignments are not preserved across a token-set change:
    /// the set of valid reassignment targets has changed.
    pub fn reset(&mut self, serials: Vec<String>) {
        self.serials = serials;
        self.clear_assignments();
    }

    /// Unassigns every serial.
    pub fn clear_assignments(&mut self) {
        for slot in self.assignments.values_mut() {
            slot.clear();
        }
    }

    /// Fills destinations in fixed order from the front of the working set,
    /// up to each destination's quota. Serials beyond total capacity remain
    /// unassigned. Deterministic and idempotent for an unchanged working set.
    pub fn auto_assign(&mut self) {
        self.clear_assignments();
        let mut cursor = 0;
        for dest in &self.destinations {
            if cursor == self.serials.len() {
                break;
            }
            let take = dest.quota.min(self.serials.len() - cursor);
            let slot = self.assignments.entry(dest.id).or_default();
            slot.extend(self.serials[cursor..cursor + take].iter().cloned());
            cursor += take;
        }
    }

    /// Rebuilds the whole assignment mapping from a declared choice set.
    ///
    /// The working set is scanned in order; a serial with no declared choice
    /// stays unassigned. Choices for serials outside the working set and
    /// choices naming unknown destinations are ignored, which keeps both
    /// invariants under adversarial call sequences. When a serial is
    /// declared more than once, the last declaration wins.
    pub fn apply_choices(&mut self, choices: &[(String, Option<DestinationId>)]) {
        let declared: HashMap<&str, Option<DestinationId>> = choices
            .iter()
            .map(|(serial, dest)| (serial.as_str(), *dest))
            .collect();
        let known: HashSet<DestinationId> = self.destinations.iter().map(|d| d.id).collect();

        for slot in self.assignments.values_mut() {
            slot.clear();
        }
        for serial in &self.serials {
            let Some(Some(dest_id)) = declared.get(serial.as_str()).copied() else {
                continue;
            };
            if !known.contains(&dest_id) {
                continue;
            }
            self.assignments
                .entry(dest_id)
                .or_default()
                .push(serial.clone());
        }
    }

    /// Current destination of a serial, or `None` when unassigned. Used by
    /// the grid renderer to pre-select radio choices.
    pub fn choice_for(&self, serial: &str) -> Option<DestinationId> {
        self.destinations
            .iter()
            .find(|dest| self.assigned(dest.id).iter().any(|s| s == serial))
            .map(|dest| dest.id)
    }

    /// Per-destination counts with quota standing, plus the unassigned count.
    pub fn counts(&self) -> AllocationCounts {
        let mut assigned_total = 0;
        let per_destination: Vec<DestinationCount> = self
            .destinations
            .iter()
            .map(|dest| {
                let assigned = self.assigned(dest.id).len();
                assigned_total += assigned;
                DestinationCount {
                    destination_id: dest.id,
                    assigned,
                    quota: dest.quota,
                    standing: QuotaStanding::from_fill(assigned, dest.quota),
                }
            })
            .collect();
        AllocationCounts {
            per_destination,
            unassigned: self.serials.len() - assigned_total,
        }
    }
}
