//! Data transfer objects for tools HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::application::ToolSummary;
use crate::domain::tools::ToolCall;

// ═══════════════════════════════════════════════════════════════════════════
// Request DTOs
// ═══════════════════════════════════════════════════════════════════════════

/// Request to call a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Name of the tool to call
    pub name: String,
    /// Tool arguments as a JSON object; may carry `confirmation_token`
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl From<CallToolRequest> for ToolCall {
    fn from(request: CallToolRequest) -> Self {
        ToolCall::new(request.name, request.arguments)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Response DTOs
// ═══════════════════════════════════════════════════════════════════════════

/// Response listing registered tools.
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResponse {
    pub count: usize,
    pub tools: Vec<ToolSummary>,
}
