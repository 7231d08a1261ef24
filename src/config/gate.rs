//! Confirmation gate configuration

use std::time::Duration;

use serde::Deserialize;

use crate::domain::confirmation::{ConfirmationPolicy, TokenBinding};

use super::error::ValidationError;

const MAX_CONFIRMATION_TTL_SECS: u64 = 86_400;
const MAX_OPERATION_TIMEOUT_SECS: u64 = 3_600;

/// Confirmation and execution policy shared by every tool gate
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Seconds an unredeemed prompt stays valid; 0 disables expiry
    #[serde(default = "default_confirmation_ttl")]
    pub confirmation_ttl_secs: u64,

    /// `unbound` or `bound_to_request`
    #[serde(default)]
    pub token_binding: TokenBinding,

    /// Deadline for a single domain operation; 0 disables it
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
}

impl GateConfig {
    /// Tracker policy derived from this configuration
    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        let ttl = (self.confirmation_ttl_secs > 0)
            .then(|| Duration::from_secs(self.confirmation_ttl_secs));
        ConfirmationPolicy::default()
            .with_ttl(ttl)
            .with_binding(self.token_binding)
    }

    /// Per-operation deadline, if any
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_secs > 0).then(|| Duration::from_secs(self.operation_timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.confirmation_ttl_secs > MAX_CONFIRMATION_TTL_SECS {
            return Err(ValidationError::ConfirmationTtlTooLong {
                max: MAX_CONFIRMATION_TTL_SECS,
            });
        }
        if self.operation_timeout_secs > MAX_OPERATION_TIMEOUT_SECS {
            return Err(ValidationError::OperationTimeoutTooLong {
                max: MAX_OPERATION_TIMEOUT_SECS,
            });
        }
        Ok(())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            confirmation_ttl_secs: default_confirmation_ttl(),
            token_binding: TokenBinding::default(),
            operation_timeout_secs: default_operation_timeout(),
        }
    }
}

fn default_confirmation_ttl() -> u64 {
    300
}

fn default_operation_timeout() -> u64 {
    60
}
