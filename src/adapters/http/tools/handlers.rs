//! HTTP handlers for tools endpoints.
//!
//! Every tool outcome (success, prompt, validation or domain error) is a
//! 200 with a `ToolResponse` body. Non-2xx statuses only come from axum
//! itself, for bodies that are not a call at all.

use std::sync::Arc;

use axum::{extract::State, Json};
use tokio::sync::watch;
use tracing::error;

use crate::application::ToolDispatcher;
use crate::domain::foundation::ErrorCode;
use crate::domain::tools::{ToolCall, ToolResponse};
use crate::ports::OperationContext;

use super::dto::{CallToolRequest, ListToolsResponse};

/// Application state for tools endpoints.
#[derive(Clone)]
pub struct ToolsAppState {
    /// Dispatcher with every registered tool
    pub dispatcher: Arc<ToolDispatcher>,
    /// Flips to `true` on shutdown; in-flight operations are cancelled
    pub shutdown: Option<watch::Receiver<bool>>,
}

impl ToolsAppState {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self {
            dispatcher,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn operation_context(&self) -> OperationContext {
        match &self.shutdown {
            Some(signal) => OperationContext::with_cancellation(signal.clone()),
            None => OperationContext::new(),
        }
    }
}

/// List registered tools.
///
/// GET /tools
pub async fn list_tools(State(state): State<ToolsAppState>) -> Json<ListToolsResponse> {
    let tools = state.dispatcher.tools();
    Json(ListToolsResponse {
        count: tools.len(),
        tools,
    })
}

/// Call a tool.
///
/// POST /tools/call
///
/// The call runs on its own task, so a client that disconnects mid-call
/// does not abort an operation that has already started.
pub async fn call_tool(
    State(state): State<ToolsAppState>,
    Json(request): Json<CallToolRequest>,
) -> Json<ToolResponse> {
    let call = ToolCall::from(request);
    let ctx = state.operation_context();
    let dispatcher = state.dispatcher.clone();

    let task = tokio::spawn(async move { dispatcher.dispatch(&call, &ctx).await });
    match task.await {
        Ok(response) => Json(response),
        Err(err) => {
            error!(error = %err, "tool call task failed");
            Json(ToolResponse::error(
                ErrorCode::InternalError,
                "tool call did not complete",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryAuditSink;
    use crate::adapters::simulated::SimulatedHost;
    use crate::application::{GateSettings, HostPorts, ToolCatalog};
    use crate::domain::audit::AuditOutcome;
    use crate::ports::AuditSink;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn disconnected_client_does_not_abort_the_call() {
        let host = Arc::new(SimulatedHost::seeded().with_latency(Duration::from_millis(100)));
        let sink = Arc::new(InMemoryAuditSink::new());
        let settings = GateSettings {
            audit: Some(sink.clone() as Arc<dyn AuditSink>),
            ..Default::default()
        };
        let catalog = ToolCatalog::build(&HostPorts::from_host(host.clone()), &settings).unwrap();
        let state = ToolsAppState::new(Arc::new(catalog.dispatcher));
        let request = CallToolRequest {
            name: "graphql_query".to_string(),
            arguments: json!({ "query": "{ info }" }),
        };

        // Dropping the handler future is what axum does when the client goes away.
        let handler = call_tool(State(state), Json(request));
        assert!(tokio::time::timeout(Duration::from_millis(10), handler)
            .await
            .is_err());
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(host.executed_queries().await, vec!["{ info }".to_string()]);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome(), &AuditOutcome::Ok);
    }
}
