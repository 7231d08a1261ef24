//! Tools - request and response value objects shared by every handler.

mod tool_call;
mod tool_response;

pub use tool_call::{ToolCall, ToolParameters, CONFIRMATION_TOKEN_PARAM};
pub use tool_response::{ToolResponse, ToolStatus};
