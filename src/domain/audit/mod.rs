//! Audit - immutable records of completed tool invocations.

mod record;

pub use record::{AuditOutcome, AuditRecord};
