//! Confirmation - two-call protocol for destructive tools.
//!
//! A destructive call without a valid token is answered with a prompt and a
//! fresh token; repeating the call with that token lets it through once.
//!
//! ## Key Types
//!
//! - [`ConfirmationTracker`] - Issues and redeems tokens for one tool group
//! - [`PendingConfirmation`] - One outstanding prompt
//! - [`ConfirmationToken`] - 128-bit single-use credential

mod pending;
mod token;
mod tracker;

pub use pending::PendingConfirmation;
pub use token::{ConfirmationToken, TOKEN_BYTES, TOKEN_HEX_LEN};
pub use tracker::{
    ConfirmationPolicy, ConfirmationTracker, TokenBinding, DEFAULT_CONFIRMATION_TTL,
};
