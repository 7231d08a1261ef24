//! `ups_status` tool. Read-only, never gated.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{
    ConfirmationPrompt, GatedTool, OperationContext, PowerSource, ToolOutput, UpsMonitor,
};

pub const UPS_STATUS: &str = "ups_status";

pub struct UpsStatusTool {
    ups: Arc<dyn UpsMonitor>,
}

impl UpsStatusTool {
    pub fn new(ups: Arc<dyn UpsMonitor>) -> Self {
        Self { ups }
    }
}

#[async_trait]
impl GatedTool for UpsStatusTool {
    type Request = ();

    fn name(&self) -> &'static str {
        UPS_STATUS
    }

    fn validate(&self, _params: &ToolParameters) -> Result<(), ValidationError> {
        Ok(())
    }

    fn is_destructive(&self, _request: &()) -> bool {
        false
    }

    fn describe_for_prompt(&self, _request: &()) -> ConfirmationPrompt {
        ConfirmationPrompt::new("ups", "Reads UPS telemetry.")
    }

    async fn execute(&self, _request: &(), _ctx: &OperationContext) -> Result<ToolOutput, OperationError> {
        let status = self.ups.ups_status().await?;
        let source = match status.source {
            PowerSource::Mains => "on mains",
            PowerSource::Battery => "ON BATTERY",
        };
        let message = format!(
            "{} {source}: battery {}%, load {}%, runtime {} min.",
            status.model,
            status.battery_charge_percent,
            status.load_percent,
            status.runtime_secs / 60
        );
        Ok(ToolOutput::new(message).with_data(json!(status)))
    }
}
