//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the gating core and the outside world. Adapters implement these ports.
//!
//! ## Gate Ports
//!
//! - `GatedTool` - Per-tool contract driven by the gating skeleton
//! - `AuditSink` - Best-effort destination for audit records
//!
//! ## Host Operation Ports
//!
//! - `ArrayControl` - Storage array start/stop and parity checks
//! - `VmControl` - Virtual machine lifecycle
//! - `NotificationStore` - Notification inbox
//! - `UpsMonitor` - UPS telemetry
//! - `QueryPassthrough` - Raw queries against the backing API

mod array_control;
mod audit_sink;
mod gated_tool;
mod notification_store;
mod query_passthrough;
mod ups_monitor;
mod vm_control;

pub use array_control::{ArrayControl, ArrayState, ParityAction, ParityStatus};
pub use audit_sink::{AuditSink, AuditSinkError};
pub use gated_tool::{ConfirmationPrompt, GatedTool, OperationContext, ToolOutput};
pub use notification_store::{Importance, Notification, NotificationFilter, NotificationStore};
pub use query_passthrough::QueryPassthrough;
pub use ups_monitor::{PowerSource, UpsMonitor, UpsStatus};
pub use vm_control::{VmAction, VmControl, VmInfo, VmSpec, VmState};
