//! Shared vocabulary types for products, destinations and allocation counts.

use serde::{Deserialize, Serialize};

/// Identifier of a product line item inside the enclosing form workflow.
pub type ProductId = u64;

/// Identifier of a shipment destination belonging to a product.
pub type DestinationId = u64;

/// A shipment target with a fixed quantity of serials to fill.
///
/// Destination order is significant: the position inside a product's
/// destination vector determines auto-assignment priority and is fixed at
/// registration time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub id: DestinationId,
    pub name: String,
    /// Quantity to be shipped to this destination.
    pub quota: usize,
}

/// Three-way fill state of a destination, used for presentation coloring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStanding {
    Under,
    Met,
    Over,
}

impl QuotaStanding {
    /// Classifies an assigned count against a quota.
    pub fn from_fill(assigned: usize, quota: usize) -> Self {
        match assigned.cmp(&quota) {
            std::cmp::Ordering::Less => QuotaStanding::Under,
            std::cmp::Ordering::Equal => QuotaStanding::Met,
            std::cmp::Ordering::Greater => QuotaStanding::Over,
        }
    }
}

/// Assigned count for one destination together with its quota standing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationCount {
    pub destination_id: DestinationId,
    pub assigned: usize,
    pub quota: usize,
    pub standing: QuotaStanding,
}

/// Snapshot of assignment counts for one product.
///
/// `unassigned` always equals the working-set length minus the sum of the
/// per-destination assigned counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationCounts {
    pub per_destination: Vec<DestinationCount>,
    pub unassigned: usize,
}
