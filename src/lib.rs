//! Hostgate - confirmation-gated execution for privileged host tools
//!
//! Destructive tools (stopping the array, deleting VMs, clearing
//! notifications, mutating passthrough queries) run only after a two-call
//! confirmation handshake. Every execution attempt, successful or not, is
//! written once to an audit trail.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
