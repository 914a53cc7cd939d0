//! Key Admission Audit Module
//!
//! Every attempt to add a key to a [`crate::RootKeyChain`] produces exactly
//! one [`AuditRecord`]. The chain does not know where records go; it is
//! handed an [`AuditSink`] at construction.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// Outcome of one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditOutcome {
    /// Self-test passed, key appended
    Admitted,
    /// Self-test failed, chain unchanged
    Rejected,
    /// Appended without running the self-test
    SkippedValidation,
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuditOutcome::Admitted => "admitted",
            AuditOutcome::Rejected => "rejected",
            AuditOutcome::SkippedValidation => "skipped-validation",
        };
        f.write_str(label)
    }
}

/// Structured record of one admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub outcome: AuditOutcome,
    pub key_name: String,
    pub key_id: String,
    /// Unix epoch milliseconds
    pub timestamp: u64,
}

impl AuditRecord {
    pub fn new(outcome: AuditOutcome, key_name: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self {
            outcome,
            key_name: key_name.into(),
            key_id: key_id.into(),
            timestamp: current_timestamp(),
        }
    }
}

/// Destination for admission audit records.
///
/// `record` runs while the chain holds its admission lock but not its entry
/// lock: a sink may read the chain (`len`, `entries`, lookups) but must not
/// call [`crate::RootKeyChain::add`] on it.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        match record.outcome {
            AuditOutcome::Admitted => info!(
                outcome = %record.outcome,
                key_name = %record.key_name,
                key_id = %record.key_id,
                "Added key"
            ),
            AuditOutcome::SkippedValidation => warn!(
                outcome = %record.outcome,
                key_name = %record.key_name,
                key_id = %record.key_id,
                "Added key without validation"
            ),
            AuditOutcome::Rejected => error!(
                outcome = %record.outcome,
                key_name = %record.key_name,
                key_id = %record.key_id,
                "Failed to add key"
            ),
        }
    }
}

/// Keeps records in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, outcome: AuditOutcome) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.outcome == outcome)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
