//! Audit record entity - one entry per completed tool invocation.
//!
//! Records are built once the handler reaches a terminal outcome (success or
//! error). Confirmation prompts are not terminal and never produce a record.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::domain::foundation::{InvocationId, Timestamp};

/// Terminal outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The operation ran and reported success.
    Ok,
    /// Validation or the operation failed with the given message.
    Error(String),
}

impl AuditOutcome {
    /// Creates an error outcome from anything displayable.
    pub fn error(message: impl fmt::Display) -> Self {
        Self::Error(message.to_string())
    }

    /// Returns true for [`AuditOutcome::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

impl Serialize for AuditOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Immutable audit entry for one handler invocation.
///
/// # Invariants
///
/// - `parameters` never contains `confirmation_token`
/// - Exactly one record exists per invocation that reached a terminal outcome
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Correlates the record with log lines for the same call
    invocation_id: InvocationId,

    tool_name: String,

    /// Validated request parameters, token stripped, ordered by name
    parameters: BTreeMap<String, serde_json::Value>,

    outcome: AuditOutcome,

    /// When the invocation started
    timestamp: Timestamp,

    duration_ms: u64,
}

impl AuditRecord {
    /// Creates a record for an invocation that started at `started_at` and
    /// ran for `elapsed`.
    pub fn new(
        invocation_id: InvocationId,
        tool_name: impl Into<String>,
        parameters: BTreeMap<String, serde_json::Value>,
        outcome: AuditOutcome,
        started_at: Timestamp,
        elapsed: Duration,
    ) -> Self {
        Self {
            invocation_id,
            tool_name: tool_name.into(),
            parameters,
            outcome,
            timestamp: started_at,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub fn outcome(&self) -> &AuditOutcome {
        &self.outcome
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Renders the record as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(outcome: AuditOutcome) -> AuditRecord {
        let mut parameters = BTreeMap::new();
        parameters.insert("vm_id".to_string(), json!("vm-1"));
        parameters.insert("action".to_string(), json!("stop"));
        AuditRecord::new(
            InvocationId::new(),
            "vm_control",
            parameters,
            outcome,
            Timestamp::now(),
            Duration::from_millis(42),
        )
    }

    #[test]
    fn outcome_renders_ok_and_error_prefix() {
        assert_eq!(AuditOutcome::Ok.to_string(), "ok");
        assert_eq!(
            AuditOutcome::error("vm vm-9 not found").to_string(),
            "error: vm vm-9 not found"
        );
    }

    #[test]
    fn serializes_as_flat_json_object() {
        let record = record(AuditOutcome::error("boom"));
        let value: serde_json::Value = serde_json::from_str(&record.to_json_line().unwrap()).unwrap();

        assert_eq!(value["tool_name"], "vm_control");
        assert_eq!(value["outcome"], "error: boom");
        assert_eq!(value["duration_ms"], 42);
        assert_eq!(value["parameters"]["action"], "stop");
        assert!(value["timestamp"].is_string());
        assert!(value["invocation_id"].is_string());
    }

    #[test]
    fn parameters_serialize_in_name_order() {
        let line = record(AuditOutcome::Ok).to_json_line().unwrap();
        let action = line.find("\"action\"").unwrap();
        let vm_id = line.find("\"vm_id\"").unwrap();
        assert!(action < vm_id);
    }

    #[test]
    fn json_line_has_no_newlines() {
        let line = record(AuditOutcome::error("multi\nline")).to_json_line().unwrap();
        assert!(!line.contains('\n'));
    }
}
