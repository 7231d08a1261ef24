//! Axum router configuration for tools endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{call_tool, list_tools, ToolsAppState};

/// Create the tools API router.
///
/// # Routes
///
/// - `GET /` - List registered tools and whether each is gated
/// - `POST /call` - Call a tool
pub fn tools_routes() -> Router<ToolsAppState> {
    Router::new()
        .route("/", get(list_tools))
        .route("/call", post(call_tool))
}

/// Create the complete tools module router, mounted at `/tools`.
pub fn tools_router() -> Router<ToolsAppState> {
    Router::new().nest("/tools", tools_routes())
}
