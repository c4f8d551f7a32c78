//! Debounced validation scheduling.
//!
//! Rapid edits to a serial textarea are coalesced: a quiet period must
//! elapse with no further edits before a validation request is issued, and
//! every new edit cancels the pending timer and restarts it. In-flight HTTP
//! requests are not cancelled at the transport level; their effects are
//! discarded by the engine's epoch compare, so the latest request always
//! wins regardless of network arrival order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::SerialEntryEngine;
use crate::oracle::ValidationOracle;
use crate::types::ProductId;

/// Per-product cancelable debounce timer driving the validation oracle.
pub struct ValidationScheduler {
    engine: Arc<Mutex<SerialEntryEngine>>,
    oracle: Arc<dyn ValidationOracle>,
    quiet: Duration,
    pending: Mutex<HashMap<ProductId, JoinHandle<()>>>,
}

impl ValidationScheduler {
    pub fn new(
        engine: Arc<Mutex<SerialEntryEngine>>,
        oracle: Arc<dyn ValidationOracle>,
        quiet: Duration,
    ) -> Self {
        Self {
            engine,
            oracle,
            quiet,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Notes a qualifying edit: the pending timer for this product (if any)
    /// is cancelled and a fresh quiet period starts. Must be called from
    /// within a tokio runtime.
    pub fn note_edit(&self, product_id: ProductId) {
        let engine = Arc::clone(&self.engine);
        let oracle = Arc::clone(&self.oracle);
        let quiet = self.quiet;

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.remove(&product_id) {
            previous.abort();
        }
        pending.insert(
            product_id,
            tokio::spawn(async move {
                tokio::time::sleep(quiet).await;
                // Quiet period satisfied: detach the round so a later edit
                // cancels pending timers only, never an issued request. A
                // superseded round's verdict is discarded by the epoch check.
                tokio::spawn(run_validation_round(engine, oracle, product_id));
            }),
        );
    }

    /// Runs one validation round immediately, bypassing the quiet period.
    pub async fn validate_now(&self, product_id: ProductId) {
        run_validation_round(Arc::clone(&self.engine), Arc::clone(&self.oracle), product_id).await;
    }

    /// Cancels the pending timer for one product.
    pub fn cancel(&self, product_id: ProductId) {
        if let Some(handle) = self.lock_pending().remove(&product_id) {
            handle.abort();
        }
    }

    /// Cancels every pending timer. Called on workflow teardown.
    pub fn cancel_all(&self) {
        for (_, handle) in self.lock_pending().drain() {
            handle.abort();
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<ProductId, JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ValidationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// One validation round: snapshot the request under the engine lock, release
/// it for the oracle round-trip, relock to apply the verdict. The lock is
/// never held across an await.
///
/// Transport failures are logged and otherwise ignored: a validation outage
/// must not block data entry, and the last-known validation display is
/// retained. Submission gating is driven by local checks only.
async fn run_validation_round(
    engine: Arc<Mutex<SerialEntryEngine>>,
    oracle: Arc<dyn ValidationOracle>,
    product_id: ProductId,
) {
    let prepared = lock_engine(&engine).prepare_validation(product_id);
    let Some((epoch, request)) = prepared else {
        return;
    };

    match oracle.validate(&request).await {
        Ok(verdict) => {
            lock_engine(&engine).apply_verdict(product_id, epoch, &verdict);
        }
        Err(err) => {
            warn!(
                product_id,
                error = %err,
                "serial validation transport failure; keeping last-known state"
            );
        }
    }
}

fn lock_engine(engine: &Arc<Mutex<SerialEntryEngine>>) -> MutexGuard<'_, SerialEntryEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
