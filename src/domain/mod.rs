//! Domain layer containing the gating protocol types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, IDs, errors)
//! - `confirmation` - One-time tokens and the tracker that issues them
//! - `audit` - Records of completed tool invocations
//! - `tools` - Tool call and response value objects

pub mod audit;
pub mod confirmation;
pub mod foundation;
pub mod tools;
