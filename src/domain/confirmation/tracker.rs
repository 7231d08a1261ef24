//! Confirmation tracker - issues and redeems one-time confirmation tokens.
//!
//! A tracker is constructed once per domain group of tools (array, vm, ...)
//! with the fixed list of tool names it gates. It is shared by every handler
//! in that group through an `Arc` and guards its token map with a single
//! mutex whose critical sections never span an `.await`.
//!
//! # Invariants
//!
//! - At most one [`PendingConfirmation`] exists per token value.
//! - A token redeemed once is never valid again.
//! - Concurrent redemptions of one token yield exactly one `true`.
//! - Unknown, empty and malformed tokens never change tracker state.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::foundation::Timestamp;

use super::{ConfirmationToken, PendingConfirmation};

/// Default lifetime of an unredeemed prompt.
pub const DEFAULT_CONFIRMATION_TTL: Duration = Duration::from_secs(300);

/// Whether a token is tied to the tool and resource it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBinding {
    /// Any outstanding token in the tracker authorizes any gated call.
    #[default]
    Unbound,
    /// A token only authorizes the tool and resource it was issued for.
    /// Presenting it for anything else burns it.
    BoundToRequest,
}

/// Redemption rules applied by a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// How long an unredeemed prompt stays valid. `None` disables expiry.
    pub ttl: Option<Duration>,
    /// Token binding mode.
    pub binding: TokenBinding,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_CONFIRMATION_TTL),
            binding: TokenBinding::Unbound,
        }
    }
}

impl ConfirmationPolicy {
    /// Sets the prompt lifetime.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the binding mode.
    pub fn with_binding(mut self, binding: TokenBinding) -> Self {
        self.binding = binding;
        self
    }
}

/// Process-wide store of outstanding confirmation prompts for one tool group.
#[derive(Debug)]
pub struct ConfirmationTracker {
    /// Label for log lines, e.g. `array`
    scope: String,

    /// Tools this tracker gates; anything else never needs confirmation
    gated_tools: HashSet<String>,

    policy: ConfirmationPolicy,

    /// Outstanding prompts keyed by token value
    pending: Mutex<HashMap<String, PendingConfirmation>>,
}

impl ConfirmationTracker {
    /// Creates a tracker gating the given tool names with the default policy.
    pub fn new<I, S>(scope: impl Into<String>, gated_tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scope.into(),
            gated_tools: gated_tools.into_iter().map(Into::into).collect(),
            policy: ConfirmationPolicy::default(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the redemption policy.
    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns true if `tool_name` is in this tracker's destructive set.
    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        self.gated_tools.contains(tool_name)
    }

    /// Issues a new token for a prompt about to be shown to the caller.
    ///
    /// Always succeeds. Expired prompts are swept while the lock is held.
    pub fn request_confirmation(
        &self,
        tool_name: &str,
        resource_label: &str,
        description: &str,
    ) -> ConfirmationToken {
        let now = Timestamp::now();
        let mut pending = self.lock();

        if let Some(ttl) = self.policy.ttl {
            pending.retain(|_, record| !record.is_expired(Some(ttl), &now));
        }

        let token = loop {
            let record = PendingConfirmation::issue(tool_name, resource_label, description);
            let token = record.token().clone();
            // 128-bit collisions are not expected; the loop keeps the
            // one-record-per-token invariant unconditional anyway.
            if let Entry::Vacant(slot) = pending.entry(token.as_str().to_owned()) {
                slot.insert(record);
                break token;
            }
        };
        let outstanding = pending.len();
        drop(pending);

        debug!(
            scope = %self.scope,
            tool = tool_name,
            resource = resource_label,
            outstanding,
            "confirmation requested"
        );
        token
    }

    /// Redeems `token` regardless of which tool or resource it was issued for.
    ///
    /// Returns `true` exactly once per issued token. Empty, malformed,
    /// unknown, consumed and expired tokens return `false`.
    pub fn confirm(&self, token: &str) -> bool {
        self.take(token).is_some()
    }

    /// Redeems `token` for a specific tool call, applying the binding policy.
    pub fn redeem(&self, token: &str, tool_name: &str, resource_label: &str) -> bool {
        match self.policy.binding {
            TokenBinding::Unbound => self.confirm(token),
            TokenBinding::BoundToRequest => match self.take(token) {
                Some(record) if record.matches(tool_name, resource_label) => true,
                Some(record) => {
                    warn!(
                        scope = %self.scope,
                        issued_tool = record.tool_name(),
                        issued_resource = record.resource_label(),
                        tool = tool_name,
                        resource = resource_label,
                        "confirmation token presented for a different request; token burned"
                    );
                    false
                }
                None => false,
            },
        }
    }

    /// Removes every expired prompt and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.policy.ttl else {
            return 0;
        };
        let now = Timestamp::now();
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, record| !record.is_expired(Some(ttl), &now));
        before - pending.len()
    }

    /// Returns the number of outstanding prompts.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns the scope label.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the redemption policy.
    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    /// Atomically removes and returns a live record for `token`.
    fn take(&self, token: &str) -> Option<PendingConfirmation> {
        if !ConfirmationToken::is_well_formed(token) {
            return None;
        }
        let now = Timestamp::now();
        let record = self.lock().remove(token)?;
        if record.is_expired(self.policy.ttl, &now) {
            debug!(scope = %self.scope, tool = record.tool_name(), "confirmation token expired");
            return None;
        }
        debug!(
            scope = %self.scope,
            tool = record.tool_name(),
            resource = record.resource_label(),
            "confirmation redeemed"
        );
        Some(record)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingConfirmation>> {
        // The map holds plain data; a panic elsewhere cannot leave it torn.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
