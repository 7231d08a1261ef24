//! Audit sink adapters.
//!
//! - `JsonLinesAuditSink` - append-only JSON Lines to a file or stderr
//! - `TracingAuditSink` - structured `tracing` events on `hostgate::audit`
//! - `InMemoryAuditSink` - keeps records for inspection

mod in_memory;
mod json_lines;
mod tracing_sink;

pub use in_memory::InMemoryAuditSink;
pub use json_lines::JsonLinesAuditSink;
pub use tracing_sink::TracingAuditSink;

use std::io;
use std::sync::Arc;

use crate::config::{AuditConfig, AuditDestination};
use crate::ports::AuditSink;

/// Builds the sink selected by `config`.
///
/// `destination = none` yields no sink at all; gates then skip the audit
/// step entirely.
pub fn sink_from_config(config: &AuditConfig) -> io::Result<Option<Arc<dyn AuditSink>>> {
    let sink: Arc<dyn AuditSink> = match config.destination {
        AuditDestination::None => return Ok(None),
        AuditDestination::Stderr => Arc::new(JsonLinesAuditSink::stderr()),
        AuditDestination::Tracing => Arc::new(TracingAuditSink),
        AuditDestination::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "audit.path is required")
            })?;
            Arc::new(JsonLinesAuditSink::open(path)?)
        }
    };
    Ok(Some(sink))
}
