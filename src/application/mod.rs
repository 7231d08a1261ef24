//! Application layer - the gating skeleton, tool handlers and dispatch.
//!
//! - `gate` - `ToolGate`, the validate/confirm/execute/audit sequence
//! - `tools` - one `GatedTool` per remotely callable tool
//! - `dispatcher` - name-based routing to gated tools
//! - `catalog` - wires tools, trackers and gates together

pub mod catalog;
pub mod dispatcher;
pub mod gate;
pub mod tools;

pub use catalog::{GateSettings, HostPorts, ToolCatalog};
pub use dispatcher::{DispatchError, ToolDispatcher, ToolSummary};
pub use gate::ToolGate;
