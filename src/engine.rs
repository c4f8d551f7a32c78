//! The event-driven core: text-input, grid-change and button handlers, plus
//! the epoch-guarded projection of validation verdicts.
//!
//! All mutation happens inside discrete synchronous handler calls; the
//! engine never suspends mid-mutation, so state transitions are atomic with
//! respect to the host's event loop. After every allocation mutation the
//! engine re-projects the submission payload, refreshes counters and
//! re-evaluates the submission gate.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::gate::{self, GateDecision};
use crate::oracle::{SerialValidationRequest, SerialValidationVerdict};
use crate::payload::FormPayload;
use crate::presentation::{
    PresentationSink, STYLE_COUNT_MET, STYLE_COUNT_NEUTRAL, STYLE_COUNT_OVER, STYLE_COUNT_UNDER,
    Severity,
};
use crate::store::{AllocationStore, ProductEntry};
use crate::tokenize::{scan_duplicates, tokenize_serials};
use crate::types::{AllocationCounts, Destination, DestinationId, ProductId, QuotaStanding};

fn style_for(standing: QuotaStanding) -> &'static str {
    match standing {
        QuotaStanding::Under => STYLE_COUNT_UNDER,
        QuotaStanding::Met => STYLE_COUNT_MET,
        QuotaStanding::Over => STYLE_COUNT_OVER,
    }
}

/// Serial entry and allocation engine for one form workflow.
pub struct SerialEntryEngine {
    config: EngineConfig,
    store: AllocationStore,
    payload: FormPayload,
    sink: Arc<dyn PresentationSink>,
}

impl SerialEntryEngine {
    pub fn new(config: EngineConfig, sink: Arc<dyn PresentationSink>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store: AllocationStore::new(),
            payload: FormPayload::new(),
            sink,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current hidden submission payload.
    pub fn payload(&self) -> &FormPayload {
        &self.payload
    }

    /// Registers a product line item with its fixed destination order.
    pub fn register_product(
        &mut self,
        product_id: ProductId,
        required: usize,
        destinations: Vec<Destination>,
    ) {
        info!(product_id, required, "registering product for serial entry");
        self.store.register(product_id, required, destinations);
    }

    /// Removes a product and every payload field it produced.
    pub fn remove_product(&mut self, product_id: ProductId) {
        if !self.store.remove(product_id) {
            warn!(product_id, "remove requested for unregistered product");
            return;
        }
        self.payload.remove_product(product_id);
        self.refresh_gate();
    }

    /// Tears the whole workflow view down.
    pub fn teardown(&mut self) {
        self.store.clear();
        self.payload = FormPayload::new();
        self.refresh_gate();
    }

    /// Handles an edit of a product's raw serial textarea: tokenize, scan
    /// for local duplicates, reset the allocation state, and re-project
    /// everything downstream. Validation is not triggered here; the host
    /// routes the same edit through the scheduler's debounce.
    pub fn handle_serial_input(&mut self, product_id: ProductId, raw: &str) {
        let (entered, required, duplicates) = {
            let Some(entry) = self.store.get_mut(product_id) else {
                warn!(product_id, "serial input for unregistered product");
                return;
            };
            let tokens = tokenize_serials(raw);
            let scan = scan_duplicates(&tokens);
            let entered = tokens.len();
            entry.duplicates = scan.duplicates.clone();
            entry.state.reset(scan.unique);
            (entered, entry.required, scan.duplicates)
        };
        debug!(product_id, entered, "serial input handled");

        self.update_entered_badge(product_id, entered, required);
        if !duplicates.is_empty() {
            self.sink.toast(
                &format!("Duplicate serials: {}", duplicates.join(", ")),
                Severity::Error,
            );
        }
        if entered > required {
            self.sink.toast(
                &format!(
                    "Too many serials entered. Remove {} to proceed.",
                    entered - required
                ),
                Severity::Error,
            );
        }
        self.render_product(product_id);
        self.sync_payload(product_id);
        self.refresh_gate();
    }

    /// Fills each destination's quota in fixed order from the front of the
    /// working set.
    pub fn auto_assign(&mut self, product_id: ProductId) {
        let Some(entry) = self.store.get_mut(product_id) else {
            warn!(product_id, "auto-assign for unregistered product");
            return;
        };
        entry.state.auto_assign();
        self.render_product(product_id);
        self.sync_payload(product_id);
        self.refresh_gate();
    }

    /// Sets every serial of a product back to unassigned.
    pub fn clear_assignments(&mut self, product_id: ProductId) {
        let Some(entry) = self.store.get_mut(product_id) else {
            warn!(product_id, "clear-assignments for unregistered product");
            return;
        };
        entry.state.clear_assignments();
        self.render_product(product_id);
        self.sync_payload(product_id);
        self.refresh_gate();
    }

    /// Applies the grid's declared per-serial choices, rebuilding the whole
    /// assignment mapping. Counters are refreshed in place; the grid itself
    /// is not re-rendered because the change originated there.
    pub fn handle_grid_change(
        &mut self,
        product_id: ProductId,
        choices: &[(String, Option<DestinationId>)],
    ) {
        let Some(entry) = self.store.get_mut(product_id) else {
            warn!(product_id, "grid change for unregistered product");
            return;
        };
        entry.state.apply_choices(choices);
        if let Some(entry) = self.store.get(product_id) {
            self.update_counters(product_id, entry);
        }
        self.sync_payload(product_id);
        self.refresh_gate();
    }

    /// Current counts snapshot for a product.
    pub fn counts(&self, product_id: ProductId) -> Option<AllocationCounts> {
        self.store.get(product_id).map(|entry| entry.state.counts())
    }

    /// Evaluates the submission gate across all products.
    pub fn evaluate_gate(&self) -> GateDecision {
        gate::evaluate(&self.store)
    }

    /// Issues a new validation request for a product, bumping its epoch.
    /// Returns `None` for unregistered products and for empty working sets:
    /// empty-token requests must never reach the oracle.
    pub fn prepare_validation(
        &mut self,
        product_id: ProductId,
    ) -> Option<(u64, SerialValidationRequest)> {
        let serial_numbers = {
            let entry = self.store.get(product_id)?;
            if entry.state.serials().is_empty() {
                debug!(product_id, "skipping validation for empty serial set");
                return None;
            }
            entry.state.serials().join("\n")
        };
        let epoch = self.store.next_epoch(product_id)?;
        debug!(product_id, epoch, "validation request issued");
        Some((
            epoch,
            SerialValidationRequest {
                project_id: self.config.project_id,
                product_id: Some(product_id),
                serial_numbers,
                exclude_document_id: self.config.exclude_document_id,
            },
        ))
    }

    /// Applies a validation verdict if its epoch is still current; stale
    /// verdicts are discarded without touching any visible state. Returns
    /// whether the verdict was applied.
    ///
    /// Cross-record conflicts are advisory: they are rendered but never
    /// remove serials from the allocation state or block the gate.
    pub fn apply_verdict(
        &self,
        product_id: ProductId,
        epoch: u64,
        verdict: &SerialValidationVerdict,
    ) -> bool {
        match self.store.current_epoch(product_id) {
            Some(current) if current == epoch => {
                debug!(product_id, epoch, valid = verdict.valid, "validation verdict applied");
                self.sink.render_validation(product_id, verdict);
                true
            }
            Some(current) => {
                debug!(product_id, epoch, current, "discarding stale validation verdict");
                false
            }
            None => {
                warn!(product_id, "verdict for unregistered product");
                false
            }
        }
    }

    fn update_entered_badge(&self, product_id: ProductId, entered: usize, required: usize) {
        self.sink.set_badge(
            &format!("counter-{product_id}"),
            &format!("Entered: {entered} / Required: {required}"),
            style_for(QuotaStanding::from_fill(entered, required)),
        );
    }

    fn update_counters(&self, product_id: ProductId, entry: &ProductEntry) {
        let counts = entry.state.counts();
        for dest in &counts.per_destination {
            self.sink.set_badge(
                &format!("counter-{product_id}-{}", dest.destination_id),
                &format!("{}/{}", dest.assigned, dest.quota),
                style_for(dest.standing),
            );
        }
        self.sink.set_badge(
            &format!("counter-{product_id}-unassigned"),
            &counts.unassigned.to_string(),
            STYLE_COUNT_NEUTRAL,
        );
    }

    fn render_product(&self, product_id: ProductId) {
        let Some(entry) = self.store.get(product_id) else {
            return;
        };
        self.sink
            .render_grid(product_id, entry.state.serials(), entry.state.destinations());
        self.update_counters(product_id, entry);
    }

    fn sync_payload(&mut self, product_id: ProductId) {
        let Some(entry) = self.store.get(product_id) else {
            return;
        };
        self.payload.sync_product(product_id, &entry.state);
    }

    fn refresh_gate(&self) {
        let decision = gate::evaluate(&self.store);
        self.sink.set_submit_enabled(!decision.is_blocked());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::BlockReason;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq, Eq)]
    enum SinkEvent {
        Toast(String, &'static str),
        Badge(String, String, String),
        Grid(ProductId, Vec<String>),
        Validation(ProductId, bool),
        Submit(bool),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SinkEvent>>,
    }

    impl RecordingSink {
        fn drain(&self) -> Vec<SinkEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        fn push(&self, event: SinkEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl PresentationSink for RecordingSink {
        fn toast(&self, message: &str, severity: Severity) {
            let label = match severity {
                Severity::Info => "info",
                Severity::Success => "success",
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            self.push(SinkEvent::Toast(message.to_string(), label));
        }

        fn set_badge(&self, key: &str, text: &str, style_class: &str) {
            self.push(SinkEvent::Badge(
                key.to_string(),
                text.to_string(),
                style_class.to_string(),
            ));
        }

        fn render_grid(&self, product_id: ProductId, serials: &[String], _dests: &[Destination]) {
            self.push(SinkEvent::Grid(product_id, serials.to_vec()));
        }

        fn render_validation(&self, product_id: ProductId, verdict: &SerialValidationVerdict) {
            self.push(SinkEvent::Validation(product_id, verdict.valid));
        }

        fn set_submit_enabled(&self, enabled: bool) {
            self.push(SinkEvent::Submit(enabled));
        }
    }

    fn engine_with_sink() -> (SerialEntryEngine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let engine = SerialEntryEngine::new(
            EngineConfig::default().with_project(42),
            sink.clone(),
        )
        .expect("engine construction should succeed");
        (engine, sink)
    }

    fn register_default(engine: &mut SerialEntryEngine) {
        engine.register_product(
            7,
            4,
            vec![
                Destination {
                    id: 1,
                    name: "D1".into(),
                    quota: 2,
                },
                Destination {
                    id: 2,
                    name: "D2".into(),
                    quota: 2,
                },
            ],
        );
    }

    fn verdict(valid: bool) -> SerialValidationVerdict {
        SerialValidationVerdict {
            valid,
            duplicate_in_input: Vec::new(),
            duplicate_in_records: Vec::new(),
            total_count: 0,
        }
    }

    #[test]
    fn serial_input_resets_state_and_projects_payload() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);
        sink.drain();

        engine.handle_serial_input(7, "A\nB\nC\nD");

        assert_eq!(engine.payload().get("serials_7"), Some("A\nB\nC\nD"));
        assert_eq!(engine.counts(7).expect("registered").unassigned, 4);

        let events = sink.drain();
        assert!(events.contains(&SinkEvent::Grid(
            7,
            vec!["A".into(), "B".into(), "C".into(), "D".into()]
        )));
        assert!(events.contains(&SinkEvent::Badge(
            "counter-7".into(),
            "Entered: 4 / Required: 4".into(),
            STYLE_COUNT_MET.into()
        )));
        assert!(events.contains(&SinkEvent::Submit(true)));
    }

    #[test]
    fn auto_assign_scenario_two_by_two() {
        let (mut engine, _sink) = engine_with_sink();
        register_default(&mut engine);

        engine.handle_serial_input(7, "A\nB\nC\nD");
        engine.auto_assign(7);

        assert_eq!(engine.payload().get("assign_7_1"), Some("A\nB"));
        assert_eq!(engine.payload().get("assign_7_2"), Some("C\nD"));
        assert_eq!(engine.counts(7).expect("registered").unassigned, 0);
    }

    #[test]
    fn duplicate_input_blocks_submission_and_toasts() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);
        sink.drain();

        engine.handle_serial_input(7, "A\nA\nB");

        // Working set is deduplicated; the raw entered count drives the badge.
        assert_eq!(engine.payload().get("serials_7"), Some("A\nB"));
        let decision = engine.evaluate_gate();
        assert!(matches!(
            decision.reasons.as_slice(),
            [BlockReason::DuplicateSerials { product_id: 7, serials }]
                if serials == &vec!["A".to_string()]
        ));

        let events = sink.drain();
        assert!(events.contains(&SinkEvent::Toast("Duplicate serials: A".into(), "error")));
        assert!(events.contains(&SinkEvent::Submit(false)));
    }

    #[test]
    fn overflow_blocks_with_exact_excess() {
        let (mut engine, sink) = engine_with_sink();
        engine.register_product(
            9,
            3,
            vec![Destination {
                id: 1,
                name: "D1".into(),
                quota: 3,
            }],
        );
        sink.drain();

        engine.handle_serial_input(9, "A\nB\nC\nD");

        let decision = engine.evaluate_gate();
        assert_eq!(
            decision.reasons,
            vec![BlockReason::Overflow {
                product_id: 9,
                entered: 4,
                required: 3,
                excess: 1,
            }]
        );
        let events = sink.drain();
        assert!(events.contains(&SinkEvent::Toast(
            "Too many serials entered. Remove 1 to proceed.".into(),
            "error"
        )));
    }

    #[test]
    fn editing_input_clears_previous_block() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);

        engine.handle_serial_input(7, "A\nA\nB");
        assert!(engine.evaluate_gate().is_blocked());

        engine.handle_serial_input(7, "A\nB");
        assert!(!engine.evaluate_gate().is_blocked());
        assert!(sink.drain().contains(&SinkEvent::Submit(true)));
    }

    #[test]
    fn grid_change_rebuilds_assignments() {
        let (mut engine, _sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nB\nC");

        engine.handle_grid_change(
            7,
            &[
                ("A".into(), Some(2)),
                ("B".into(), Some(1)),
                ("C".into(), None),
            ],
        );

        assert_eq!(engine.payload().get("assign_7_1"), Some("B"));
        assert_eq!(engine.payload().get("assign_7_2"), Some("A"));
        assert_eq!(engine.counts(7).expect("registered").unassigned, 1);
    }

    #[test]
    fn prepare_validation_skips_empty_and_bumps_epoch() {
        let (mut engine, _sink) = engine_with_sink();
        register_default(&mut engine);

        assert!(engine.prepare_validation(7).is_none());

        engine.handle_serial_input(7, "A\nB");
        let (epoch, request) = engine.prepare_validation(7).expect("non-empty set validates");
        assert_eq!(epoch, 1);
        assert_eq!(request.project_id, 42);
        assert_eq!(request.product_id, Some(7));
        assert_eq!(request.serial_numbers, "A\nB");

        let (epoch, _) = engine.prepare_validation(7).expect("second round");
        assert_eq!(epoch, 2);
    }

    #[test]
    fn stale_verdict_leaves_display_unchanged() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nB");

        let (old_epoch, _) = engine.prepare_validation(7).expect("first request");
        let (new_epoch, _) = engine.prepare_validation(7).expect("second request");
        sink.drain();

        assert!(!engine.apply_verdict(7, old_epoch, &verdict(false)));
        assert!(sink.drain().is_empty());

        assert!(engine.apply_verdict(7, new_epoch, &verdict(true)));
        assert_eq!(sink.drain(), vec![SinkEvent::Validation(7, true)]);
    }

    #[test]
    fn reregistering_mid_flight_keeps_old_verdicts_stale() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nB");
        let (old_epoch, _) = engine.prepare_validation(7).expect("first request");

        // The line item is replaced while that request is still in flight.
        register_default(&mut engine);
        engine.handle_serial_input(7, "X\nY");
        let (new_epoch, _) = engine.prepare_validation(7).expect("second request");
        assert!(new_epoch > old_epoch);
        sink.drain();

        assert!(!engine.apply_verdict(7, old_epoch, &verdict(false)));
        assert!(sink.drain().is_empty());
        assert!(engine.apply_verdict(7, new_epoch, &verdict(true)));
    }

    #[test]
    fn cross_record_conflicts_never_block_the_gate() {
        let (mut engine, _sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nB\nC\nD");

        let (epoch, _) = engine.prepare_validation(7).expect("request");
        let conflicted = SerialValidationVerdict {
            valid: false,
            duplicate_in_input: Vec::new(),
            duplicate_in_records: vec![crate::oracle::RecordConflict {
                serial_number: "A".into(),
                document_number: "DOC-1".into(),
                document_status: "issued".into(),
            }],
            total_count: 4,
        };
        assert!(engine.apply_verdict(7, epoch, &conflicted));

        // Advisory only: the working set and the gate are untouched.
        assert_eq!(engine.counts(7).expect("registered").unassigned, 4);
        assert!(!engine.evaluate_gate().is_blocked());
    }

    #[test]
    fn unknown_product_handlers_are_noops() {
        let (mut engine, sink) = engine_with_sink();
        sink.drain();

        engine.handle_serial_input(99, "A");
        engine.auto_assign(99);
        engine.clear_assignments(99);
        engine.handle_grid_change(99, &[]);
        engine.remove_product(99);

        assert!(sink.drain().is_empty());
        assert!(engine.payload().fields().is_empty());
    }

    #[test]
    fn remove_product_drops_payload_fields() {
        let (mut engine, _sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nB");

        engine.remove_product(7);
        assert!(engine.payload().fields().is_empty());
        assert!(engine.counts(7).is_none());
    }

    #[test]
    fn teardown_resets_everything() {
        let (mut engine, sink) = engine_with_sink();
        register_default(&mut engine);
        engine.handle_serial_input(7, "A\nA\nB\nC\nD\nE");
        assert!(engine.evaluate_gate().is_blocked());
        sink.drain();

        engine.teardown();
        assert!(engine.payload().fields().is_empty());
        assert!(!engine.evaluate_gate().is_blocked());
        assert!(sink.drain().contains(&SinkEvent::Submit(true)));
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let result = SerialEntryEngine::new(EngineConfig::default(), Arc::new(crate::NullSink));
        assert!(result.is_err());
    }
}
