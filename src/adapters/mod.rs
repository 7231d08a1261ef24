//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the gating core to the outside world:
//! - `audit` - Audit sinks (no-op, JSON Lines, tracing, in-memory)
//! - `simulated` - Simulated host implementing every host operation port
//! - `http` - Axum routes exposing the dispatcher

pub mod audit;
pub mod http;
pub mod simulated;

pub use audit::{
    sink_from_config, InMemoryAuditSink, JsonLinesAuditSink, TracingAuditSink,
};
pub use simulated::SimulatedHost;
