//! Query Passthrough Port - raw queries against the backing API.
//!
//! The query text is forwarded untouched. Mutations are recognised by the
//! tool layer so they can be gated; this port does not inspect them.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::OperationError;

#[async_trait]
pub trait QueryPassthrough: Send + Sync {
    /// Executes `query` with optional `variables` and returns the response data.
    async fn execute(&self, query: &str, variables: Option<&Value>) -> Result<Value, OperationError>;
}
