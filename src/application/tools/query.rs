//! `graphql_query` passthrough tool.
//!
//! Read queries run directly. Any document containing a mutation operation
//! is gated, as is any document that does not parse.

use std::sync::Arc;

use async_trait::async_trait;
use graphql_parser::query::{parse_query, Definition, OperationDefinition};
use serde_json::Value;
use tracing::debug;

use crate::domain::foundation::{OperationError, ValidationError};
use crate::domain::tools::ToolParameters;
use crate::ports::{ConfirmationPrompt, GatedTool, OperationContext, QueryPassthrough, ToolOutput};

pub const GRAPHQL_QUERY: &str = "graphql_query";

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub variables: Option<Value>,
    pub kind: DocumentKind,
}

pub struct GraphqlQueryTool {
    backend: Arc<dyn QueryPassthrough>,
}

impl GraphqlQueryTool {
    pub fn new(backend: Arc<dyn QueryPassthrough>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl GatedTool for GraphqlQueryTool {
    type Request = QueryRequest;

    fn name(&self) -> &'static str {
        GRAPHQL_QUERY
    }

    fn validate(&self, params: &ToolParameters) -> Result<QueryRequest, ValidationError> {
        let query = params.required_str("query")?;
        let variables = params.optional_object("variables")?.cloned().map(Value::Object);
        Ok(QueryRequest {
            query: query.to_string(),
            variables,
            kind: classify_document(query),
        })
    }

    fn is_destructive(&self, request: &QueryRequest) -> bool {
        request.kind.is_gated()
    }

    fn describe_for_prompt(&self, request: &QueryRequest) -> ConfirmationPrompt {
        let compact = request.query.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut preview: String = compact.chars().take(PREVIEW_CHARS).collect();
        if compact.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        match request.kind {
            DocumentKind::Unparsed => ConfirmationPrompt::new(
                "graphql: unparsed",
                format!("Sends a document that could not be parsed to the backing API: {preview}"),
            ),
            _ => ConfirmationPrompt::new(
                "graphql: mutation",
                format!("Sends a mutation to the backing API: {preview}"),
            ),
        }
    }

    async fn execute(
        &self,
        request: &QueryRequest,
        _ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError> {
        let data = self
            .backend
            .execute(&request.query, request.variables.as_ref())
            .await?;
        let message = match request.kind {
            DocumentKind::Read => "Query executed.",
            DocumentKind::Mutation => "Mutation executed.",
            DocumentKind::Unparsed => "Document executed.",
        };
        Ok(ToolOutput::new(message).with_data(data))
    }
}

/// How a passthrough document is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Only queries, subscriptions or anonymous selection sets.
    Read,
    /// At least one mutation operation.
    Mutation,
    /// Not valid GraphQL; always gated.
    Unparsed,
}

impl DocumentKind {
    pub fn is_gated(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// Classifies `document` by parsing it.
pub fn classify_document(document: &str) -> DocumentKind {
    let parsed = match parse_query::<&str>(document) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "passthrough document did not parse");
            return DocumentKind::Unparsed;
        }
    };
    let has_mutation = parsed.definitions.iter().any(|definition| {
        matches!(
            definition,
            Definition::Operation(OperationDefinition::Mutation(_))
        )
    });
    if has_mutation {
        DocumentKind::Mutation
    } else {
        DocumentKind::Read
    }
}

/// Returns true if `document` must be confirmed before it is sent.
pub fn contains_mutation(document: &str) -> bool {
    classify_document(document).is_gated()
}
