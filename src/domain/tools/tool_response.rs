//! Caller-facing tool results.
//!
//! Every call ends in exactly one of three shapes: a success, a
//! confirmation prompt or an in-band error. None of them is a transport
//! fault.

use serde::{Deserialize, Serialize};

use crate::domain::confirmation::ConfirmationToken;
use crate::domain::foundation::ErrorCode;

/// Which of the three result shapes a response has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    ConfirmationRequired,
    Error,
}

/// Result of a tool call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,

    /// Human-readable summary; for prompts this includes the token
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl ToolResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            status: ToolStatus::Success,
            message: message.into(),
            data,
            confirmation_token: None,
            resource: None,
            description: None,
            error_code: None,
        }
    }

    /// Creates a confirmation prompt carrying a freshly issued token.
    pub fn confirmation_required(
        tool_name: &str,
        resource: &str,
        description: &str,
        token: &ConfirmationToken,
    ) -> Self {
        let message = format!(
            "Confirmation required for {tool_name} on {resource}: {description}\n\
             To proceed, call {tool_name} again with the same arguments and \
             confirmation_token=\"{token}\"."
        );
        Self {
            status: ToolStatus::ConfirmationRequired,
            message,
            data: None,
            confirmation_token: Some(token.to_string()),
            resource: Some(resource.to_string()),
            description: Some(description.to_string()),
            error_code: None,
        }
    }

    /// Creates an in-band error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            message: message.into(),
            data: None,
            confirmation_token: None,
            resource: None,
            description: None,
            error_code: Some(code),
        }
    }

    /// Creates the response for a tool name nothing is registered under.
    pub fn unknown_tool(name: &str) -> Self {
        Self::error(ErrorCode::UnknownTool, format!("unknown tool '{name}'"))
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn is_confirmation_required(&self) -> bool {
        self.status == ToolStatus::ConfirmationRequired
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}
