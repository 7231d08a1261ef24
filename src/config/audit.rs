//! Audit trail configuration

use std::path::PathBuf;

use serde::Deserialize;

use super::error::ValidationError;

/// Where audit records are written
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditDestination {
    /// Records are discarded
    None,
    /// JSON Lines on standard error
    Stderr,
    /// JSON Lines appended to `path`
    File,
    /// Structured events on the `hostgate::audit` tracing target
    #[default]
    Tracing,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub destination: AuditDestination,

    /// Required when `destination = file`
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.destination == AuditDestination::File && self.path.is_none() {
            return Err(ValidationError::MissingRequired("audit.path"));
        }
        Ok(())
    }
}
