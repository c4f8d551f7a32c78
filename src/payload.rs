//! Projection of allocation state into the flat fields the enclosing form
//! submits.
//!
//! Every field carries the tag of the product that produced it; syncing a
//! product first removes all of its previous fields, so the payload is never
//! a superposition of an old and a new state. The synchronizer has no state
//! of its own beyond the field list and must be invoked after every
//! allocation mutation.

use crate::allocation::AllocationState;
use crate::types::ProductId;

/// One submittable key/value field, tagged with its owning product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    product_id: ProductId,
}

impl FormField {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// The hidden submission payload of the enclosing form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<FormField>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces this product's projection with the current allocation state.
    ///
    /// Writes `serials_<productId>` with the newline-joined working set
    /// (present even when empty) and `assign_<productId>_<destinationId>`
    /// per destination with at least one assigned serial. Destinations with
    /// no assigned serials contribute no field.
    pub fn sync_product(&mut self, product_id: ProductId, state: &AllocationState) {
        self.fields.retain(|field| field.product_id != product_id);

        self.fields.push(FormField {
            name: format!("serials_{product_id}"),
            value: state.serials().join("\n"),
            product_id,
        });

        for dest in state.destinations() {
            let assigned = state.assigned(dest.id);
            if assigned.is_empty() {
                continue;
            }
            self.fields.push(FormField {
                name: format!("assign_{product_id}_{}", dest.id),
                value: assigned.join("\n"),
                product_id,
            });
        }
    }

    /// Drops every field belonging to a product.
    pub fn remove_product(&mut self, product_id: ProductId) {
        self.fields.retain(|field| field.product_id != product_id);
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Value of a field by name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}
