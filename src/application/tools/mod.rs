//! Tool handlers - one `GatedTool` implementation per remotely callable tool.

mod array;
mod notifications;
mod parity;
mod query;
mod ups;
mod vm;

pub use array::{ArrayStartTool, ArrayStopTool, ARRAY_START, ARRAY_STOP};
pub use notifications::{NotificationRequest, NotificationsTool, NOTIFICATIONS};
pub use parity::{ParityCheckTool, ParityRequest, PARITY_CHECK};
pub use query::{
    classify_document, contains_mutation, DocumentKind, GraphqlQueryTool, QueryRequest, GRAPHQL_QUERY,
};
pub use ups::{UpsStatusTool, UPS_STATUS};
pub use vm::{
    VmControlRequest, VmControlTool, VmCreateTool, VmDeleteTool, VmListTool, DEFAULT_MEMORY_MIB,
    DEFAULT_VCPUS, VM_CONTROL, VM_CREATE, VM_DELETE, VM_LIST,
};
