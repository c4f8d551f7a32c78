//! Validation oracle client: wire types and the HTTP transport.
//!
//! The oracle is the authoritative uniqueness check. It receives the full
//! locally-deduplicated serial list for a product and answers with
//! within-input duplicates plus cross-record conflicts (serials already
//! consumed by other persisted documents). The engine treats cross-record
//! conflicts as advisory; they are surfaced but never remove serials from
//! the allocation state.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::OracleConfig;
use crate::types::ProductId;

// Shared HTTP client with connection pooling.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Errors surfaced by the validation oracle client.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid oracle config: {0}")]
    InvalidConfig(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {0}")]
    Status(u16),
    #[error("failed to decode verdict: {0}")]
    Decode(String),
}

/// One validation round-trip request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerialValidationRequest {
    /// Project context the uniqueness check is scoped to.
    pub project_id: u64,
    /// Product scope; omitted for project-wide checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Newline-joined serial list, already locally deduplicated.
    pub serial_numbers: String,
    /// Document whose own persisted serials must not count as conflicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_document_id: Option<i64>,
}

/// A serial already consumed by another persisted document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordConflict {
    pub serial_number: String,
    pub document_number: String,
    pub document_status: String,
}

/// Verdict of one validation round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerialValidationVerdict {
    /// True iff both duplicate collections are empty.
    pub valid: bool,
    /// Serials repeated within the submitted input (authoritative).
    #[serde(default, deserialize_with = "null_to_default")]
    pub duplicate_in_input: Vec<String>,
    /// Serials colliding with other persisted documents (advisory).
    #[serde(default, deserialize_with = "null_to_default")]
    pub duplicate_in_records: Vec<RecordConflict>,
    /// Number of serials the oracle saw in the request.
    #[serde(default)]
    pub total_count: usize,
}

// The oracle encodes empty collections as `null`.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The external uniqueness check, behind a trait so tests and non-HTTP
/// deployments can substitute their own transport.
#[async_trait]
pub trait ValidationOracle: Send + Sync {
    async fn validate(
        &self,
        request: &SerialValidationRequest,
    ) -> Result<SerialValidationVerdict, OracleError>;
}

/// HTTP transport for the validation oracle.
#[derive(Debug, Clone)]
pub struct HttpValidationOracle {
    endpoint: String,
    timeout: Duration,
}

impl HttpValidationOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        if config.endpoint_url.trim().is_empty() {
            return Err(OracleError::InvalidConfig(
                "endpoint_url is required for the HTTP oracle".into(),
            ));
        }
        Ok(Self {
            endpoint: config.endpoint_url.clone(),
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl ValidationOracle for HttpValidationOracle {
    async fn validate(
        &self,
        request: &SerialValidationRequest,
    ) -> Result<SerialValidationVerdict, OracleError> {
        let response = HTTP_CLIENT
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        response
            .json::<SerialValidationVerdict>()
            .await
            .map_err(|err| OracleError::Decode(err.to_string()))
    }
}
