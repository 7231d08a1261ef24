//! Pending confirmation entity - one prompt shown to a caller.
//!
//! When a destructive tool is invoked without a valid token, the gate asks
//! the tracker for a new [`PendingConfirmation`]. The caller sees the
//! description and must repeat the call carrying the token.

use std::time::Duration;

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::ConfirmationToken;

/// A confirmation prompt waiting to be redeemed.
///
/// # Lifecycle
///
/// 1. Created by `ConfirmationTracker::request_confirmation`
/// 2. Stored in the tracker's map, keyed by token value
/// 3. Removed by exactly one successful redemption (or by expiry)
///
/// Records are never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct PendingConfirmation {
    /// The token the caller must present
    token: ConfirmationToken,

    /// Tool the token was issued for
    tool_name: String,

    /// Human-readable target, e.g. `array` or `notif-42`
    resource_label: String,

    /// Consequence shown to the caller
    description: String,

    /// When the prompt was issued
    issued_at: Timestamp,
}

impl PendingConfirmation {
    /// Creates a new pending confirmation with a freshly generated token.
    pub fn issue(
        tool_name: impl Into<String>,
        resource_label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            token: ConfirmationToken::generate(),
            tool_name: tool_name.into(),
            resource_label: resource_label.into(),
            description: description.into(),
            issued_at: Timestamp::now(),
        }
    }

    /// Returns true if the record is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Option<Duration>, now: &Timestamp) -> bool {
        ttl.is_some_and(|ttl| self.issued_at.has_aged(ttl, now))
    }

    /// Returns true if this record was issued for the given tool and resource.
    pub fn matches(&self, tool_name: &str, resource_label: &str) -> bool {
        self.tool_name == tool_name && self.resource_label == resource_label
    }

    /// Returns the token.
    pub fn token(&self) -> &ConfirmationToken {
        &self.token
    }

    /// Returns the tool name.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Returns the resource label.
    pub fn resource_label(&self) -> &str {
        &self.resource_label
    }

    /// Returns the consequence description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns when the prompt was issued.
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }
}
