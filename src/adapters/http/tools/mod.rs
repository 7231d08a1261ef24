//! Tools HTTP adapter - REST API for gated tool calls.
//!
//! Provides endpoints for:
//! - Listing registered tools and their gating
//! - Calling a tool (including the confirmation round-trip)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;

pub use handlers::ToolsAppState;
pub use routes::tools_router;
