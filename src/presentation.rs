//! Presentation collaborator contract.
//!
//! The engine never touches a UI directly; everything user-visible flows
//! through this trait. All methods are fire-and-forget: no return value is
//! consumed and the engine's state transitions never depend on what the
//! sink does with a call.

use crate::oracle::SerialValidationVerdict;
use crate::types::{Destination, ProductId};

/// Severity of a toast/notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Style class for a counter badge whose count met its target.
pub const STYLE_COUNT_MET: &str = "count-met";
/// Style class for a counter badge whose count exceeds its target.
pub const STYLE_COUNT_OVER: &str = "count-over";
/// Style class for a counter badge whose count is below its target.
pub const STYLE_COUNT_UNDER: &str = "count-under";
/// Style class for badges with no target to compare against.
pub const STYLE_COUNT_NEUTRAL: &str = "count-neutral";

/// Outward-facing presentation surface consumed by the engine.
pub trait PresentationSink: Send + Sync {
    /// Shows a transient notification.
    fn toast(&self, message: &str, severity: Severity);

    /// Updates a counter/badge element by key.
    fn set_badge(&self, key: &str, text: &str, style_class: &str);

    /// Re-renders the assignment grid for a product. Invoked whenever the
    /// working set changes.
    fn render_grid(&self, product_id: ProductId, serials: &[String], destinations: &[Destination]);

    /// Renders the verdict of the most recent validation round. Only called
    /// with current-epoch verdicts.
    fn render_validation(&self, product_id: ProductId, verdict: &SerialValidationVerdict);

    /// Enables or disables form submission.
    fn set_submit_enabled(&self, enabled: bool);
}

/// A sink that ignores every call. Useful for headless callers and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn toast(&self, _message: &str, _severity: Severity) {}
    fn set_badge(&self, _key: &str, _text: &str, _style_class: &str) {}
    fn render_grid(
        &self,
        _product_id: ProductId,
        _serials: &[String],
        _destinations: &[Destination],
    ) {
    }
    fn render_validation(&self, _product_id: ProductId, _verdict: &SerialValidationVerdict) {}
    fn set_submit_enabled(&self, _enabled: bool) {}
}
