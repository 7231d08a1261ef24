//! Simulated host adapter for local runs and tests.

mod host;

pub use host::{SimulatedHost, QUERY_LOG_CAPACITY};
