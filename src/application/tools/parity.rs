//! `parity_check` tool.
//!
//! `action` selects a parity operation. `status` only reads progress and is
//! never gated; every other action changes array state.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{
    ArrayControl, ConfirmationPrompt, GatedTool, OperationContext, ParityAction, ToolOutput,
};

pub const PARITY_CHECK: &str = "parity_check";

const ACTIONS: [&str; 6] = ["start", "start_correcting", "pause", "resume", "cancel", "status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityRequest {
    Run(ParityAction),
    Status,
}

impl ParityRequest {
    fn label(&self) -> &'static str {
        match self {
            Self::Run(action) => action.as_str(),
            Self::Status => "status",
        }
    }
}

pub struct ParityCheckTool {
    array: Arc<dyn ArrayControl>,
}

impl ParityCheckTool {
    pub fn new(array: Arc<dyn ArrayControl>) -> Self {
        Self { array }
    }
}

#[async_trait]
impl GatedTool for ParityCheckTool {
    type Request = ParityRequest;

    fn name(&self) -> &'static str {
        PARITY_CHECK
    }

    fn validate(&self, params: &ToolParameters) -> Result<ParityRequest, ValidationError> {
        let action = params.required_str("action")?;
        if action == "status" {
            return Ok(ParityRequest::Status);
        }
        ParityAction::parse(action)
            .map(ParityRequest::Run)
            .ok_or_else(|| ValidationError::invalid_choice("action", action, &ACTIONS))
    }

    fn is_destructive(&self, request: &ParityRequest) -> bool {
        matches!(request, ParityRequest::Run(_))
    }

    fn describe_for_prompt(&self, request: &ParityRequest) -> ConfirmationPrompt {
        let description = match request {
            ParityRequest::Run(ParityAction::Start) => {
                "Starts a read-only parity check. Disk throughput drops until it finishes."
            }
            ParityRequest::Run(ParityAction::StartCorrecting) => {
                "Starts a correcting parity check that rewrites parity where it disagrees with data."
            }
            ParityRequest::Run(ParityAction::Pause) => "Pauses the running parity check.",
            ParityRequest::Run(ParityAction::Resume) => "Resumes the paused parity check.",
            ParityRequest::Run(ParityAction::Cancel) => {
                "Cancels the parity check. Progress is discarded."
            }
            ParityRequest::Status => "Reads parity check progress.",
        };
        ConfirmationPrompt::new(format!("parity_check: {}", request.label()), description)
    }

    async fn execute(
        &self,
        request: &ParityRequest,
        _ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError> {
        let status = match request {
            ParityRequest::Run(action) => self.array.parity_check(*action).await?,
            ParityRequest::Status => self.array.parity_status().await?,
        };
        let message = if !status.running {
            "No parity check running.".to_string()
        } else if status.paused {
            format!("Parity check paused at {}%.", status.progress_percent)
        } else {
            format!(
                "Parity check running at {}% ({} errors found).",
                status.progress_percent, status.errors_found
            )
        };
        Ok(ToolOutput::new(message).with_data(json!(status)))
    }
}
