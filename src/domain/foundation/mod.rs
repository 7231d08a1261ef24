//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary shared by the confirmation tracker, the audit trail and the
//! tool handlers.

mod errors;
mod ids;
mod timestamp;

pub use errors::{ErrorCode, OperationError, ValidationError};
pub use ids::InvocationId;
pub use timestamp::Timestamp;
