//! Explicit per-product state table with create/reset/destroy lifecycle.
//!
//! One entry per registered product holds the allocation state, the last
//! local duplicate scan and the request epoch used to discard stale
//! validation responses. The store is owned by the engine and passed by
//! reference to handlers; products never share serials or destination
//! sequences, the only cross-product access is the submission gate's
//! read-only scan.

use std::collections::HashMap;

use tracing::debug;

use crate::allocation::AllocationState;
use crate::types::{Destination, ProductId};

/// Store entry for one registered product.
#[derive(Debug, Clone)]
pub struct ProductEntry {
    /// Fixed number of serials this line item requires.
    pub required: usize,
    /// Working set and destination assignments.
    pub state: AllocationState,
    /// Duplicates found by the last local scan; non-empty blocks submission.
    pub duplicates: Vec<String>,
    epoch: u64,
}

impl ProductEntry {
    fn new(required: usize, destinations: Vec<Destination>) -> Self {
        Self {
            required,
            state: AllocationState::new(destinations),
            duplicates: Vec::new(),
            epoch: 0,
        }
    }
}

/// Per-product allocation state keyed by product identifier.
#[derive(Debug, Default)]
pub struct AllocationStore {
    products: HashMap<ProductId, ProductEntry>,
}

impl AllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product with empty serials and assignments. Registering
    /// an existing id replaces its entry wholesale, except for the request
    /// epoch: that carries over, so a response to a request issued before
    /// the re-register can never pass as current.
    pub fn register(&mut self, product_id: ProductId, required: usize, destinations: Vec<Destination>) {
        debug!(product_id, required, destinations = destinations.len(), "product registered");
        let mut entry = ProductEntry::new(required, destinations);
        if let Some(previous) = self.products.get(&product_id) {
            entry.epoch = previous.epoch;
        }
        self.products.insert(product_id, entry);
    }

    /// Removes a product entry; returns whether it existed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.products.remove(&product_id).is_some()
    }

    /// Drops every entry. Used when the enclosing workflow view tears down.
    pub fn clear(&mut self) {
        self.products.clear();
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.contains_key(&product_id)
    }

    pub fn get(&self, product_id: ProductId) -> Option<&ProductEntry> {
        self.products.get(&product_id)
    }

    pub fn get_mut(&mut self, product_id: ProductId) -> Option<&mut ProductEntry> {
        self.products.get_mut(&product_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductId, &ProductEntry)> {
        self.products.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Increments and returns the product's request epoch. Called once per
    /// issued validation request.
    pub fn next_epoch(&mut self, product_id: ProductId) -> Option<u64> {
        let entry = self.products.get_mut(&product_id)?;
        entry.epoch += 1;
        Some(entry.epoch)
    }

    /// Epoch of the most recently issued request, if the product exists.
    pub fn current_epoch(&self, product_id: ProductId) -> Option<u64> {
        self.products.get(&product_id).map(|entry| entry.epoch)
    }
}
