//! # serialloc
//!
//! A form-bound serial-number allocation engine. Given a bulk-pasted block of
//! serial tokens for a product line item, the crate normalizes and
//! deduplicates the tokens, validates them against server-held records for
//! cross-entity collisions, and distributes them across multiple shipment
//! destinations with fixed required quantities. The in-memory allocation
//! state stays consistent with the visible assignment grid and the hidden
//! submission payload at all times.
//!
//! ## Core Responsibilities
//!
//! - **Tokenization**: raw multi-line text becomes an ordered sequence of
//!   trimmed, non-empty serial tokens ([`tokenize_serials`]).
//! - **Local Duplicate Detection**: repeats within a single paste are
//!   reported and a first-occurrence working set is produced
//!   ([`scan_duplicates`]).
//! - **Allocation**: deterministic auto-assignment and rebuild-from-declared
//!   manual reassignment, with the invariant that a serial belongs to at
//!   most one destination ([`AllocationState`]).
//! - **Cross-record Validation**: an asynchronous round-trip to an external
//!   validation oracle, guarded by a per-product request epoch so stale
//!   responses never overwrite newer results ([`ValidationOracle`],
//!   [`ValidationScheduler`]).
//! - **Payload Projection**: allocation state projects into flat form fields
//!   the enclosing form submits ([`FormPayload`]).
//! - **Submission Gating**: overflow and unresolved local duplicates block
//!   submission; cross-record conflicts stay advisory ([`gate::evaluate`]).
//!
//! The engine itself never touches a UI: presentation is reached through the
//! [`PresentationSink`] trait, and the validation service through the
//! [`ValidationOracle`] trait.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use serialloc::{Destination, EngineConfig, NullSink, SerialEntryEngine};
//!
//! let config = EngineConfig::default().with_project(42);
//! let mut engine = SerialEntryEngine::new(config, Arc::new(NullSink))
//!     .expect("engine construction should succeed");
//!
//! engine.register_product(
//!     7,
//!     4,
//!     vec![
//!         Destination { id: 1, name: "Warehouse North".into(), quota: 2 },
//!         Destination { id: 2, name: "Warehouse South".into(), quota: 2 },
//!     ],
//! );
//! engine.handle_serial_input(7, "SN-A\nSN-B\nSN-C\nSN-D");
//! engine.auto_assign(7);
//!
//! let counts = engine.counts(7).expect("product is registered");
//! assert_eq!(counts.unassigned, 0);
//! ```

pub mod allocation;
pub mod config;
pub mod engine;
pub mod gate;
pub mod oracle;
pub mod payload;
pub mod presentation;
pub mod scheduler;
pub mod store;
pub mod tokenize;
pub mod types;

pub use allocation::AllocationState;
pub use config::{ConfigError, EngineConfig, OracleConfig};
pub use engine::SerialEntryEngine;
pub use gate::{BlockReason, GateDecision};
pub use oracle::{
    HttpValidationOracle, OracleError, RecordConflict, SerialValidationRequest,
    SerialValidationVerdict, ValidationOracle,
};
pub use payload::{FormField, FormPayload};
pub use presentation::{NullSink, PresentationSink, Severity};
pub use scheduler::ValidationScheduler;
pub use store::{AllocationStore, ProductEntry};
pub use tokenize::{DuplicateScan, scan_duplicates, tokenize_serials};
pub use types::{
    AllocationCounts, Destination, DestinationCount, DestinationId, ProductId, QuotaStanding,
};
