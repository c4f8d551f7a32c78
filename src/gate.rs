//! Submission gate: the aggregate read-only scan that decides whether the
//! enclosing form may be submitted.
//!
//! Blocking conditions are purely local: a product whose working set exceeds
//! its required count, or a product with an unresolved local duplicate set.
//! Cross-record conflicts reported by the validation oracle are advisory and
//! never block, and neither does a validation transport failure.

use crate::store::AllocationStore;
use crate::types::ProductId;

/// A single reason the gate is blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// More serials entered than the product requires.
    Overflow {
        product_id: ProductId,
        entered: usize,
        required: usize,
        /// Exact number of serials the user must remove to proceed.
        excess: usize,
    },
    /// The last input scan found repeated serials that are still unresolved.
    DuplicateSerials {
        product_id: ProductId,
        serials: Vec<String>,
    },
}

/// Outcome of a gate evaluation across all registered products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateDecision {
    pub reasons: Vec<BlockReason>,
}

impl GateDecision {
    /// True when at least one product blocks submission.
    pub fn is_blocked(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Scans every product in the store and collects block reasons.
pub fn evaluate(store: &AllocationStore) -> GateDecision {
    let mut reasons = Vec::new();
    for (product_id, entry) in store.iter() {
        let entered = entry.state.serials().len();
        if entered > entry.required {
            reasons.push(BlockReason::Overflow {
                product_id,
                entered,
                required: entry.required,
                excess: entered - entry.required,
            });
        }
        if !entry.duplicates.is_empty() {
            reasons.push(BlockReason::DuplicateSerials {
                product_id,
                serials: entry.duplicates.clone(),
            });
        }
    }
    GateDecision { reasons }
}
