//! Gated Tool Port - the fixed contract every tool handler implements.
//!
//! The gating sequence (validate, confirm, execute, audit, render) lives
//! once in `application::gate::ToolGate`. A tool only supplies the
//! pieces that differ between tools:
//!
//! - `validate` turns raw arguments into a typed request
//! - `is_destructive` decides whether that request needs confirmation
//! - `describe_for_prompt` names the target and the consequence
//! - `execute` performs the domain operation
//!
//! # Example
//!
//! ```ignore
//! struct ArrayStop { array: Arc<dyn ArrayControl> }
//!
//! #[async_trait]
//! impl GatedTool for ArrayStop {
//!     type Request = ();
//!     fn name(&self) -> &'static str { "array_stop" }
//!     fn validate(&self, _: &ToolParameters) -> Result<(), ValidationError> { Ok(()) }
//!     fn is_destructive(&self, _: &()) -> bool { true }
//!     fn describe_for_prompt(&self, _: &()) -> ConfirmationPrompt {
//!         ConfirmationPrompt::new("array", "Stops the array")
//!     }
//!     async fn execute(&self, _: &(), _: &OperationContext) -> Result<ToolOutput, OperationError> {
//!         let state = self.array.stop_array().await?;
//!         Ok(ToolOutput::new(format!("Array is {state}")))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;

/// Per-tool contract driven by the gating skeleton.
#[async_trait]
pub trait GatedTool: Send + Sync + 'static {
    /// Validated, typed form of the tool's arguments.
    type Request: Send + Sync;

    /// Name the tool is registered and gated under.
    fn name(&self) -> &'static str;

    /// Extracts and checks every parameter. Runs before any confirmation
    /// check, so an invalid call never consumes or issues a token.
    fn validate(&self, params: &ToolParameters) -> Result<Self::Request, ValidationError>;

    /// Returns true if this request needs a confirmation round-trip
    /// (given the tool is in its tracker's gated set).
    fn is_destructive(&self, request: &Self::Request) -> bool;

    /// Resource label and consequence shown in the prompt.
    fn describe_for_prompt(&self, request: &Self::Request) -> ConfirmationPrompt;

    /// Performs the domain operation.
    async fn execute(
        &self,
        request: &Self::Request,
        ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError>;
}

/// What a confirmation prompt says about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub resource_label: String,
    pub description: String,
}

impl ConfirmationPrompt {
    pub fn new(resource_label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            resource_label: resource_label.into(),
            description: description.into(),
        }
    }
}

/// Successful result of a domain operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub message: String,
    pub data: Option<Value>,
}

impl ToolOutput {
    /// Creates an output with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Attaches a structured payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Per-call context handed to `execute`.
///
/// Carries an optional cancellation signal; `true` on the watch channel
/// means the caller no longer wants the result.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancel: Option<watch::Receiver<bool>>,
}

impl OperationContext {
    /// Context with no cancellation signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context cancelled when `signal` becomes `true`.
    pub fn with_cancellation(signal: watch::Receiver<bool>) -> Self {
        Self {
            cancel: Some(signal),
        }
    }

    /// Returns true if cancellation has already been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is signalled. Never resolves without a
    /// signal, or if the sender is dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}
