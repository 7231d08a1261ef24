//! ToolDispatcher - routes a named call to its handler and gate.
//!
//! Tools with different request types are stored behind one object-safe
//! `Route` trait so the dispatcher can hold them in a single map.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::tools::{ToolCall, ToolResponse};
use crate::ports::{GatedTool, OperationContext};

use super::gate::ToolGate;

/// Errors raised while building a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// One registered tool as advertised to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSummary {
    pub name: &'static str,
    /// True if destructive requests to this tool need confirmation
    pub gated: bool,
}

#[async_trait]
trait Route: Send + Sync {
    fn is_gated(&self) -> bool;

    async fn call(&self, arguments: &Value, ctx: &OperationContext) -> ToolResponse;
}

struct GatedRoute<T> {
    tool: T,
    gate: Arc<ToolGate>,
}

#[async_trait]
impl<T: GatedTool> Route for GatedRoute<T> {
    fn is_gated(&self) -> bool {
        self.gate.gates(self.tool.name())
    }

    async fn call(&self, arguments: &Value, ctx: &OperationContext) -> ToolResponse {
        self.gate.run(&self.tool, arguments, ctx).await
    }
}

/// Registry of callable tools.
#[derive(Default)]
pub struct ToolDispatcher {
    routes: BTreeMap<&'static str, Box<dyn Route>>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` behind `gate`. Names must be unique.
    pub fn register<T: GatedTool>(
        &mut self,
        tool: T,
        gate: Arc<ToolGate>,
    ) -> Result<(), DispatchError> {
        let name = tool.name();
        if self.routes.contains_key(name) {
            return Err(DispatchError::DuplicateTool(name.to_string()));
        }
        self.routes.insert(name, Box::new(GatedRoute { tool, gate }));
        Ok(())
    }

    /// Dispatches one call. Unknown names yield an in-band `UNKNOWN_TOOL`
    /// error; no handler runs, so nothing is audited.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &OperationContext) -> ToolResponse {
        match self.routes.get(call.name()) {
            Some(route) => route.call(call.arguments(), ctx).await,
            None => {
                warn!(tool = call.name(), "call to unknown tool");
                ToolResponse::unknown_tool(call.name())
            }
        }
    }

    /// Registered tool names in sorted order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.routes.keys().copied().collect()
    }

    /// Whether `name` is gated, or `None` if no such tool is registered.
    pub fn is_gated(&self, name: &str) -> Option<bool> {
        self.routes.get(name).map(|route| route.is_gated())
    }

    /// Every registered tool with its gating flag.
    pub fn tools(&self) -> Vec<ToolSummary> {
        self.routes
            .iter()
            .map(|(name, route)| ToolSummary {
                name: *name,
                gated: route.is_gated(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("tools", &self.tool_names())
            .finish()
    }
}
