//! HTTP adapters - REST API implementations.

pub mod tools;

pub use tools::ToolsAppState;
pub use tools::tools_router;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full application router with request tracing.
pub fn app_router(state: ToolsAppState) -> Router {
    tools_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
