//! Audit sink that emits each record as a structured `tracing` event.
//!
//! Events use the `hostgate::audit` target so a subscriber filter can
//! route them separately from operational logs.

use tracing::info;

use crate::domain::audit::AuditRecord;
use crate::ports::{AuditSink, AuditSinkError};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let parameters = serde_json::to_string(record.parameters())?;
        info!(
            target: "hostgate::audit",
            invocation_id = %record.invocation_id(),
            tool = record.tool_name(),
            parameters = %parameters,
            outcome = %record.outcome(),
            timestamp = %record.timestamp(),
            duration_ms = record.duration_ms(),
            "tool invocation"
        );
        Ok(())
    }
}
