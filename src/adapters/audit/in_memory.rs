//! In-memory audit sink.
//!
//! Keeps every record for inspection. Write failures can be switched on to
//! exercise the gate's best-effort handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::domain::audit::AuditRecord;
use crate::ports::{AuditSink, AuditSinkError};

#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns a snapshot of every stored record.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().clone()
    }

    /// Returns stored records for one tool.
    pub fn records_for(&self, tool_name: &str) -> Vec<AuditRecord> {
        self.lock()
            .iter()
            .filter(|r| r.tool_name() == tool_name)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditSinkError::unavailable("in-memory sink set to fail"));
        }
        self.lock().push(record.clone());
        Ok(())
    }
}
