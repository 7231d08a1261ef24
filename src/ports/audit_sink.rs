//! Audit Sink Port - destination for completed-invocation records.
//!
//! Sinks are best-effort. The gate logs a failed write and carries on; an
//! audit failure never changes the result a caller sees.

use thiserror::Error;

use crate::domain::audit::AuditRecord;

/// Port for appending audit records.
///
/// Implementations must serialise concurrent writes so that records never
/// interleave within one line. `record` is called without any gate or
/// tracker lock held.
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    fn record(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}

/// Errors from audit sink operations.
#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("audit write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

impl AuditSinkError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    #[test]
    fn audit_sink_is_object_safe_and_thread_safe() {
        assert_send_sync::<dyn AuditSink>();
    }

    #[test]
    fn io_errors_convert() {
        let err: AuditSinkError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert_eq!(err.to_string(), "audit write failed: read-only");
    }
}
