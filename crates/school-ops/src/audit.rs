//! Fire-and-forget audit trail.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

/// One audited action against a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub resource: &'static str,
    pub action: &'static str,
    pub target_id: String,
    pub metadata: BTreeMap<String, String>,
}

impl AuditEntry {
    pub fn new(resource: &'static str, action: &'static str, target_id: impl ToString) -> Self {
        Self {
            resource,
            action,
            target_id: target_id.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Outbound audit hook (database table, log shipper, ...).
pub trait AuditSink: Send + Sync {
    fn log(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Writes the entry to the sink; failures are logged and never propagated.
pub fn record(sink: &dyn AuditSink, entry: AuditEntry) {
    let resource = entry.resource;
    let action = entry.action;
    if let Err(err) = sink.log(entry) {
        warn!(resource, action, error = %err, "audit log write failed");
    }
}

/// Emits audit entries as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log(&self, entry: AuditEntry) -> Result<(), AuditError> {
        info!(
            target: "audit",
            resource = entry.resource,
            action = entry.action,
            target_id = %entry.target_id,
            metadata = ?entry.metadata,
            "audit"
        );
        Ok(())
    }
}

/// Keeps entries in memory so tests can assert on them.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn actions(&self) -> Vec<(&'static str, &'static str)> {
        self.entries()
            .iter()
            .map(|entry| (entry.resource, entry.action))
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn log(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }
}
