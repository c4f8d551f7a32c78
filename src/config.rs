//! Runtime configuration for the allocation engine and its validation
//! oracle client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("project_id must be non-zero")]
    MissingProjectId,
    #[error("debounce quiet period must be non-zero")]
    ZeroDebounce,
    #[error("oracle endpoint url must be set")]
    MissingEndpoint,
}

/// Configuration for the HTTP validation oracle client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Endpoint accepting serial validation requests.
    pub endpoint_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            timeout_ms: 30_000,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        Ok(())
    }
}

/// Runtime configuration for one engine instance.
///
/// An engine serves a single form workflow, so the project context and the
/// optional document exclusion (editing an existing document must not
/// collide with its own persisted serials) live here rather than per call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Semantic version of the engine configuration.
    pub version: u32,
    /// Project context sent with every validation request.
    pub project_id: u64,
    /// Document to exclude from cross-record checks, when editing one.
    pub exclude_document_id: Option<i64>,
    /// Quiet period that must elapse with no further edits before a
    /// validation request is issued.
    pub debounce_quiet_ms: u64,
    /// Validation oracle client settings.
    pub oracle: OracleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            project_id: 0,
            exclude_document_id: None,
            debounce_quiet_ms: 500,
            oracle: OracleConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_project(mut self, project_id: u64) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_exclude_document(mut self, document_id: i64) -> Self {
        self.exclude_document_id = Some(document_id);
        self
    }

    pub fn with_debounce_quiet_ms(mut self, millis: u64) -> Self {
        self.debounce_quiet_ms = millis;
        self
    }

    pub fn with_oracle_endpoint(mut self, url: impl Into<String>) -> Self {
        self.oracle.endpoint_url = url.into();
        self
    }

    pub fn debounce_quiet(&self) -> Duration {
        Duration::from_millis(self.debounce_quiet_ms)
    }

    /// Checks invariants the engine relies on. The oracle endpoint is
    /// validated separately by [`crate::HttpValidationOracle::new`] so
    /// engines wired to a non-HTTP oracle need no endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id == 0 {
            return Err(ConfigError::MissingProjectId);
        }
        if self.debounce_quiet_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }
}
