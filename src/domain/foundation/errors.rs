//! Error types for the domain layer.
//!
//! Two families reach the gate: [`ValidationError`] for structurally invalid
//! tool input (detected before any confirmation check) and [`OperationError`]
//! for failures reported by a domain operation. Both are rendered in-band;
//! [`ErrorCode`] gives callers a stable label for each.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while extracting and checking tool parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required parameter '{field}'")]
    MissingParameter { field: String },

    #[error("parameter '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("invalid value '{value}' for '{field}': expected one of {}", .allowed.join(", "))]
    InvalidChoice {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("parameter '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("parameter '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },
}

impl ValidationError {
    /// Creates a missing parameter error.
    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::MissingParameter { field: field.into() }
    }

    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid choice error for an enumerated parameter.
    pub fn invalid_choice(
        field: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        ValidationError::InvalidChoice {
            field: field.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }
}

/// Failures reported by a domain operation (or imposed on it by the gate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The target resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The target exists but is in the wrong state for the request.
    #[error("{0}")]
    InvalidState(String),

    /// The backing API or control plane failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// The caller's cancellation signal fired before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation exceeded the configured deadline.
    #[error("operation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// Unexpected failure inside the operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// Creates a not found error.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns the stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Backend(_) => ErrorCode::BackendUnavailable,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::TimedOut(_) => ErrorCode::TimedOut,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// Stable error labels carried in in-band error results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    ValidationFailed,
    UnknownTool,

    // Domain errors
    NotFound,
    InvalidState,
    BackendUnavailable,
    Cancelled,
    TimedOut,

    // Infrastructure errors
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::UnknownTool => "UNKNOWN_TOOL",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::BackendUnavailable => "BACKEND_UNAVAILABLE",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::TimedOut => "TIMED_OUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}
