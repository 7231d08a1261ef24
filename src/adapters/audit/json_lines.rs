//! Append-only JSON Lines audit sink.
//!
//! Each record is serialised to one line before the writer lock is taken,
//! then written and flushed under the lock so concurrent records never
//! interleave.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::domain::audit::AuditRecord;
use crate::ports::{AuditSink, AuditSinkError};

/// Writes one JSON object per line to a file or stderr.
pub struct JsonLinesAuditSink {
    writer: Mutex<Box<dyn Write + Send>>,
    destination: String,
}

impl JsonLinesAuditSink {
    /// Opens (or creates) `path` in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file, path.display().to_string()))
    }

    /// Writes to the process's standard error.
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr(), "stderr")
    }

    /// Writes to an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static, destination: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            destination: destination.into(),
        }
    }

    /// Returns where records go, for startup logging.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl std::fmt::Debug for JsonLinesAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesAuditSink")
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let line = record.to_json_line()?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
