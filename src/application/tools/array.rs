//! Array lifecycle tools: `array_start` and `array_stop`.
//!
//! Both take no parameters and are always destructive.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{ArrayControl, ConfirmationPrompt, GatedTool, OperationContext, ToolOutput};

pub const ARRAY_START: &str = "array_start";
pub const ARRAY_STOP: &str = "array_stop";

const ARRAY_RESOURCE: &str = "array";

pub struct ArrayStartTool {
    array: Arc<dyn ArrayControl>,
}

impl ArrayStartTool {
    pub fn new(array: Arc<dyn ArrayControl>) -> Self {
        Self { array }
    }
}

#[async_trait]
impl GatedTool for ArrayStartTool {
    type Request = ();

    fn name(&self) -> &'static str {
        ARRAY_START
    }

    fn validate(&self, _params: &ToolParameters) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_destructive(&self, _request: &()) -> bool {
        true
    }

    fn describe_for_prompt(&self, _request: &()) -> ConfirmationPrompt {
        ConfirmationPrompt::new(
            ARRAY_RESOURCE,
            "Starts the storage array and mounts every data disk.",
        )
    }

    async fn execute(&self, _request: &(), _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        let state = self.array.start_array().await?;
        Ok(ToolOutput::new(format!("Array {state}.")).with_data(json!({ "state": state })))
    }
}

pub struct ArrayStopTool {
    array: Arc<dyn ArrayControl>,
}

impl ArrayStopTool {
    pub fn new(array: Arc<dyn ArrayControl>) -> Self {
        Self { array }
    }
}

#[async_trait]
impl GatedTool for ArrayStopTool {
    type Request = ();

    fn name(&self) -> &'static str {
        ARRAY_STOP
    }

    fn validate(&self, _params: &ToolParameters) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_destructive(&self, _request: &()) -> bool {
        true
    }

    fn describe_for_prompt(&self, _request: &()) -> ConfirmationPrompt {
        ConfirmationPrompt::new(
            ARRAY_RESOURCE,
            "Stops the storage array. Shares become unavailable and running VMs are shut down.",
        )
    }

    async fn execute(&self, _request: &(), _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        let state = self.array.stop_array().await?;
        Ok(ToolOutput::new(format!("Array {state}.")).with_data(json!({ "state": state })))
    }
}
