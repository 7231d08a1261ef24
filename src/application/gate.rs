//! ToolGate - the single gating skeleton shared by every tool.
//!
//! `ToolGate::run` drives one call through a fixed sequence:
//!
//! 1. Validate the arguments. Failures are audited and returned in-band;
//!    no token is consumed or issued.
//! 2. If the tracker gates this tool and the request is destructive,
//!    redeem the supplied token. On failure issue a new token and return a
//!    prompt. Prompts are not audited and the operation does not run.
//! 3. Run the domain operation, guarded against panics, cancellation and
//!    an optional deadline.
//! 4. Append exactly one audit record, even if the call is dropped while
//!    the operation is still running.
//! 5. Render a success or an in-band error.
//!
//! Every path returns a `ToolResponse`; nothing surfaces as a transport fault.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::domain::audit::{AuditOutcome, AuditRecord};
use crate::domain::confirmation::ConfirmationTracker;
use crate::domain::foundation::{ErrorCode, InvocationId, OperationError, Timestamp};
use crate::domain::tools::{ToolParameters, ToolResponse};
use crate::ports::{AuditSink, GatedTool, OperationContext, ToolOutput};

/// Audit message for calls whose future was dropped mid-operation.
const ABORTED: &str = "operation aborted";

/// Shared gating policy for a group of tools.
///
/// Holds the group's tracker (if any tool in it is destructive), the audit
/// sink, and the optional per-operation deadline.
#[derive(Clone)]
pub struct ToolGate {
    tracker: Option<Arc<ConfirmationTracker>>,
    audit: Option<Arc<dyn AuditSink>>,
    operation_timeout: Option<Duration>,
}

impl ToolGate {
    /// Creates a gate. A `None` sink makes auditing silent.
    pub fn new(
        tracker: Option<Arc<ConfirmationTracker>>,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Self {
        Self {
            tracker,
            audit,
            operation_timeout: None,
        }
    }

    /// Gate for informational tools that never need confirmation.
    pub fn ungated(audit: Option<Arc<dyn AuditSink>>) -> Self {
        Self::new(None, audit)
    }

    /// Bounds how long a domain operation may run.
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Returns the tracker, if this gate has one.
    pub fn tracker(&self) -> Option<&Arc<ConfirmationTracker>> {
        self.tracker.as_ref()
    }

    /// Returns true if `tool_name` is in this gate's destructive set.
    pub fn gates(&self, tool_name: &str) -> bool {
        self.tracker
            .as_ref()
            .is_some_and(|tracker| tracker.requires_confirmation(tool_name))
    }

    /// Runs one call of `tool` with raw JSON `arguments`.
    pub async fn run<T: GatedTool>(
        &self,
        tool: &T,
        arguments: &Value,
        ctx: &OperationContext,
    ) -> ToolResponse {
        let invocation_id = InvocationId::new();
        let started_at = Timestamp::now();
        let clock = Instant::now();
        let name = tool.name();

        let validated = ToolParameters::from_value(arguments.clone()).and_then(|params| {
            let request = tool.validate(&params)?;
            Ok((params, request))
        });
        let (params, request) = match validated {
            Ok(validated) => validated,
            Err(err) => {
                debug!(%invocation_id, tool = name, error = %err, "tool arguments rejected");
                let audited = ToolParameters::from_value(arguments.clone())
                    .map(|p| p.without_token())
                    .unwrap_or_default();
                self.append_audit(AuditRecord::new(
                    invocation_id,
                    name,
                    audited,
                    AuditOutcome::error(&err),
                    started_at,
                    clock.elapsed(),
                ));
                return ToolResponse::error(ErrorCode::ValidationFailed, err.to_string());
            }
        };

        if let Some(tracker) = self.confirming_tracker(name, tool.is_destructive(&request)) {
            let prompt = tool.describe_for_prompt(&request);
            if !tracker.redeem(params.confirmation_token(), name, &prompt.resource_label) {
                let token = tracker.request_confirmation(
                    name,
                    &prompt.resource_label,
                    &prompt.description,
                );
                info!(
                    %invocation_id,
                    tool = name,
                    resource = %prompt.resource_label,
                    "confirmation required"
                );
                return ToolResponse::confirmation_required(
                    name,
                    &prompt.resource_label,
                    &prompt.description,
                    &token,
                );
            }
        }

        let audit = AuditGuard::arm(
            self,
            invocation_id,
            name,
            params.without_token(),
            started_at,
            clock,
        );
        let result = self.execute(tool, &request, ctx).await;
        let elapsed = clock.elapsed();

        audit.complete(
            match &result {
                Ok(_) => AuditOutcome::Ok,
                Err(err) => AuditOutcome::error(err),
            },
            elapsed,
        );

        match result {
            Ok(output) => {
                info!(
                    %invocation_id,
                    tool = name,
                    duration_ms = elapsed.as_millis() as u64,
                    "tool succeeded"
                );
                ToolResponse::success(output.message, output.data)
            }
            Err(err) => {
                warn!(
                    %invocation_id,
                    tool = name,
                    error = %err,
                    duration_ms = elapsed.as_millis() as u64,
                    "tool failed"
                );
                ToolResponse::error(err.code(), err.to_string())
            }
        }
    }

    /// Returns the tracker to consult when this call needs confirmation.
    fn confirming_tracker(&self, tool_name: &str, destructive: bool) -> Option<&ConfirmationTracker> {
        if !destructive {
            return None;
        }
        self.tracker
            .as_deref()
            .filter(|tracker| tracker.requires_confirmation(tool_name))
    }

    async fn execute<T: GatedTool>(
        &self,
        tool: &T,
        request: &T::Request,
        ctx: &OperationContext,
    ) -> Result<ToolOutput, OperationError> {
        if ctx.is_cancelled() {
            return Err(OperationError::Cancelled);
        }

        let operation = async {
            let guarded = AssertUnwindSafe(tool.execute(request, ctx)).catch_unwind();
            let finished = match self.operation_timeout {
                Some(limit) => match tokio::time::timeout(limit, guarded).await {
                    Ok(finished) => finished,
                    Err(_) => return Err(OperationError::TimedOut(limit)),
                },
                None => guarded.await,
            };
            match finished {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(tool = tool.name(), panic = %message, "tool operation panicked");
                    Err(OperationError::Internal(message))
                }
            }
        };

        tokio::select! {
            result = operation => result,
            () = ctx.cancelled() => Err(OperationError::Cancelled),
        }
    }

    fn append_audit(&self, record: AuditRecord) {
        let Some(sink) = &self.audit else {
            return;
        };
        if let Err(err) = sink.record(&record) {
            warn!(
                invocation_id = %record.invocation_id(),
                tool = record.tool_name(),
                error = %err,
                "failed to write audit record"
            );
        }
    }
}

/// Owes exactly one audit record from the moment execution starts.
///
/// If the `run` future is dropped before the operation reports back, the
/// record is written on drop with an `operation aborted` outcome.
struct AuditGuard<'a> {
    gate: &'a ToolGate,
    invocation_id: InvocationId,
    tool_name: &'static str,
    parameters: Option<BTreeMap<String, Value>>,
    started_at: Timestamp,
    clock: Instant,
}

impl<'a> AuditGuard<'a> {
    fn arm(
        gate: &'a ToolGate,
        invocation_id: InvocationId,
        tool_name: &'static str,
        parameters: BTreeMap<String, Value>,
        started_at: Timestamp,
        clock: Instant,
    ) -> Self {
        Self {
            gate,
            invocation_id,
            tool_name,
            parameters: Some(parameters),
            started_at,
            clock,
        }
    }

    fn complete(mut self, outcome: AuditOutcome, elapsed: Duration) {
        self.write(outcome, elapsed);
    }

    fn write(&mut self, outcome: AuditOutcome, elapsed: Duration) {
        let Some(parameters) = self.parameters.take() else {
            return;
        };
        self.gate.append_audit(AuditRecord::new(
            self.invocation_id,
            self.tool_name,
            parameters,
            outcome,
            self.started_at,
            elapsed,
        ));
    }
}

impl Drop for AuditGuard<'_> {
    fn drop(&mut self) {
        if self.parameters.is_none() {
            return;
        }
        warn!(
            invocation_id = %self.invocation_id,
            tool = self.tool_name,
            "tool call dropped before the operation finished"
        );
        let elapsed = self.clock.elapsed();
        self.write(AuditOutcome::error(ABORTED), elapsed);
    }
}

impl std::fmt::Debug for ToolGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGate")
            .field("tracker", &self.tracker.as_ref().map(|t| t.scope()))
            .field("audit", &self.audit.is_some())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::InMemoryAuditSink;
    use crate::domain::confirmation::{ConfirmationPolicy, TokenBinding};
    use crate::domain::foundation::ValidationError;
    use crate::domain::tools::ToolStatus;
    use crate::ports::ConfirmationPrompt;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::watch;

    // ─────────────────────────────────────────────────────────────────────
    // Test tool
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Behaviour {
        Succeed,
        Fail,
        Panic,
        Hang,
    }

    /// `wipe` takes `mode` ∈ {inspect, erase}; only `erase` is destructive.
    struct WipeTool {
        behaviour: Behaviour,
        executions: AtomicUsize,
    }

    impl WipeTool {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                executions: AtomicUsize::new(0),
            }
        }

        fn executions(&self) -> usize {
            self.executions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GatedTool for WipeTool {
        type Request = String;

        fn name(&self) -> &'static str {
            "wipe"
        }

        fn validate(&self, params: &ToolParameters) -> Result<String, ValidationError> {
            let mode = params.required_str("mode")?;
            match mode {
                "inspect" | "erase" => Ok(mode.to_string()),
                other => Err(ValidationError::invalid_choice("mode", other, &["inspect", "erase"])),
            }
        }

        fn is_destructive(&self, mode: &String) -> bool {
            mode == "erase"
        }

        fn describe_for_prompt(&self, mode: &String) -> ConfirmationPrompt {
            ConfirmationPrompt::new(format!("disk: {mode}"), "Erases every block on the disk")
        }

        async fn execute(
            &self,
            mode: &String,
            _ctx: &OperationContext,
        ) -> Result<ToolOutput, OperationError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(ToolOutput::new(format!("{mode} done"))),
                Behaviour::Fail => Err(OperationError::not_found("disk sdx")),
                Behaviour::Panic => panic!("controller exploded"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    Ok(ToolOutput::new("unreachable"))
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Test helpers
    // ─────────────────────────────────────────────────────────────────────

    fn tracker() -> Arc<ConfirmationTracker> {
        Arc::new(ConfirmationTracker::new("disk", ["wipe"]))
    }

    fn gate_with(tracker: Arc<ConfirmationTracker>, sink: &Arc<InMemoryAuditSink>) -> ToolGate {
        let sink: Arc<dyn AuditSink> = sink.clone();
        ToolGate::new(Some(tracker), Some(sink))
    }

    fn erase(token: Option<&str>) -> Value {
        match token {
            Some(token) => json!({ "mode": "erase", "confirmation_token": token }),
            None => json!({ "mode": "erase" }),
        }
    }

    async fn prompt_token(gate: &ToolGate, tool: &WipeTool) -> String {
        let response = gate.run(tool, &erase(None), &OperationContext::new()).await;
        assert_eq!(response.status, ToolStatus::ConfirmationRequired);
        response.confirmation_token.unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn destructive_call_without_token_prompts_without_side_effects() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let tracker = tracker();
        let gate = gate_with(tracker.clone(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);

        let response = gate.run(&tool, &erase(None), &OperationContext::new()).await;

        assert!(response.is_confirmation_required());
        assert_eq!(response.resource.as_deref(), Some("disk: erase"));
        assert_eq!(tool.executions(), 0);
        assert!(sink.is_empty());
        assert_eq!(tracker.pending_count(), 1);
    }

    #[tokio::test]
    async fn valid_token_executes_once_and_audits_once() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = gate_with(tracker(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);
        let token = prompt_token(&gate, &tool).await;

        let response = gate
            .run(&tool, &erase(Some(&token)), &OperationContext::new())
            .await;

        assert!(response.is_success());
        assert_eq!(response.message, "erase done");
        assert_eq!(tool.executions(), 1);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].outcome().is_ok());
        assert!(!records[0].parameters().contains_key("confirmation_token"));
        assert_eq!(records[0].parameters()["mode"], json!("erase"));
    }

    #[tokio::test]
    async fn replayed_token_prompts_again() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = gate_with(tracker(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);
        let token = prompt_token(&gate, &tool).await;

        gate.run(&tool, &erase(Some(&token)), &OperationContext::new())
            .await;
        let replay = gate
            .run(&tool, &erase(Some(&token)), &OperationContext::new())
            .await;

        assert!(replay.is_confirmation_required());
        assert_ne!(replay.confirmation_token.as_deref(), Some(token.as_str()));
        assert_eq!(tool.executions(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn validation_runs_before_confirmation() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let tracker = tracker();
        let gate = gate_with(tracker.clone(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);
        let token = prompt_token(&gate, &tool).await;

        let response = gate
            .run(
                &tool,
                &json!({ "mode": "shred", "confirmation_token": token }),
                &OperationContext::new(),
            )
            .await;

        assert_eq!(response.error_code, Some(ErrorCode::ValidationFailed));
        assert!(response.message.contains("shred"));
        // The outstanding token survives and no new one is issued.
        assert_eq!(tracker.pending_count(), 1);
        assert_eq!(tool.executions(), 0);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].outcome().to_string().starts_with("error: "));
        assert!(!records[0].parameters().contains_key("confirmation_token"));
    }

    #[tokio::test]
    async fn non_object_arguments_are_a_validation_error() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = gate_with(tracker(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);

        let response = gate
            .run(&tool, &json!("erase"), &OperationContext::new())
            .await;

        assert_eq!(response.error_code, Some(ErrorCode::ValidationFailed));
        assert_eq!(sink.len(), 1);
        assert!(sink.records()[0].parameters().is_empty());
    }

    #[tokio::test]
    async fn informational_request_skips_confirmation() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let tracker = tracker();
        let gate = gate_with(tracker.clone(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);

        let response = gate
            .run(&tool, &json!({ "mode": "inspect" }), &OperationContext::new())
            .await;

        assert!(response.is_success());
        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn tool_outside_gated_set_runs_directly() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = gate_with(Arc::new(ConfirmationTracker::new("disk", ["format"])), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);

        let response = gate.run(&tool, &erase(None), &OperationContext::new()).await;

        assert!(response.is_success());
        assert!(!gate.gates("wipe"));
    }

    #[tokio::test]
    async fn domain_failure_is_in_band_and_audited() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = gate_with(tracker(), &sink);
        let tool = WipeTool::new(Behaviour::Fail);
        let token = prompt_token(&gate, &tool).await;

        let response = gate
            .run(&tool, &erase(Some(&token)), &OperationContext::new())
            .await;

        assert!(response.is_error());
        assert_eq!(response.error_code, Some(ErrorCode::NotFound));
        assert_eq!(response.message, "disk sdx not found");
        assert_eq!(
            sink.records()[0].outcome(),
            &AuditOutcome::Error("disk sdx not found".to_string())
        );
    }

    #[tokio::test]
    async fn panicking_operation_becomes_internal_error() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = ToolGate::ungated(Some(sink.clone() as Arc<dyn AuditSink>));
        let tool = WipeTool::new(Behaviour::Panic);

        let response = gate
            .run(&tool, &json!({ "mode": "inspect" }), &OperationContext::new())
            .await;

        assert_eq!(response.error_code, Some(ErrorCode::InternalError));
        assert!(response.message.contains("controller exploded"));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = ToolGate::ungated(Some(sink.clone() as Arc<dyn AuditSink>))
            .with_operation_timeout(Some(Duration::from_secs(30)));
        let tool = WipeTool::new(Behaviour::Hang);

        let response = gate
            .run(&tool, &json!({ "mode": "inspect" }), &OperationContext::new())
            .await;

        assert_eq!(response.error_code, Some(ErrorCode::TimedOut));
        assert_eq!(response.message, "operation timed out after 30s");
        assert_eq!(
            sink.records()[0].outcome().to_string(),
            "error: operation timed out after 30s"
        );
    }

    #[tokio::test]
    async fn cancellation_is_reported_and_audited() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = ToolGate::ungated(Some(sink.clone() as Arc<dyn AuditSink>));
        let tool = WipeTool::new(Behaviour::Hang);
        let (cancel, signal) = watch::channel(false);
        let ctx = OperationContext::with_cancellation(signal);

        let arguments = json!({ "mode": "inspect" });
        let call = gate.run(&tool, &arguments, &ctx);
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.send(true).unwrap();
        };
        let (response, ()) = tokio::join!(call, trigger);

        assert_eq!(response.error_code, Some(ErrorCode::Cancelled));
        assert_eq!(response.message, "operation cancelled");
        assert_eq!(sink.records()[0].outcome().to_string(), "error: operation cancelled");
    }

    #[tokio::test]
    async fn dropped_call_is_audited_as_aborted() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let gate = ToolGate::ungated(Some(sink.clone() as Arc<dyn AuditSink>));
        let tool = WipeTool::new(Behaviour::Hang);
        let arguments = json!({ "mode": "inspect" });

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            gate.run(&tool, &arguments, &OperationContext::new()),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(tool.executions(), 1);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome().to_string(), "error: operation aborted");
        assert_eq!(records[0].parameters()["mode"], json!("inspect"));
    }

    #[tokio::test]
    async fn already_cancelled_context_skips_the_operation() {
        let gate = ToolGate::ungated(None);
        let tool = WipeTool::new(Behaviour::Succeed);
        let (_cancel, signal) = watch::channel(true);

        let response = gate
            .run(
                &tool,
                &json!({ "mode": "inspect" }),
                &OperationContext::with_cancellation(signal),
            )
            .await;

        assert_eq!(response.error_code, Some(ErrorCode::Cancelled));
        assert_eq!(tool.executions(), 0);
    }

    #[tokio::test]
    async fn failing_sink_does_not_change_the_result() {
        let sink = Arc::new(InMemoryAuditSink::new());
        sink.set_failing(true);
        let gate = gate_with(tracker(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);
        let token = prompt_token(&gate, &tool).await;

        let response = gate
            .run(&tool, &erase(Some(&token)), &OperationContext::new())
            .await;

        assert!(response.is_success());
        assert_eq!(tool.executions(), 1);
    }

    #[tokio::test]
    async fn missing_sink_matches_present_sink_results() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let audited = gate_with(tracker(), &sink);
        let silent = ToolGate::new(Some(tracker()), None);
        let tool = WipeTool::new(Behaviour::Succeed);

        for gate in [&audited, &silent] {
            let token = prompt_token(gate, &tool).await;
            let response = gate
                .run(&tool, &erase(Some(&token)), &OperationContext::new())
                .await;
            assert!(response.is_success());
            let invalid = gate
                .run(&tool, &json!({}), &OperationContext::new())
                .await;
            assert_eq!(invalid.error_code, Some(ErrorCode::ValidationFailed));
        }
    }

    #[tokio::test]
    async fn bound_token_for_another_resource_is_burned() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let tracker = Arc::new(
            ConfirmationTracker::new("disk", ["wipe"]).with_policy(
                ConfirmationPolicy::default().with_binding(TokenBinding::BoundToRequest),
            ),
        );
        let gate = gate_with(tracker.clone(), &sink);
        let tool = WipeTool::new(Behaviour::Succeed);
        let stolen = tracker.request_confirmation("wipe", "disk: other", "Something else");

        let response = gate
            .run(&tool, &erase(Some(stolen.as_str())), &OperationContext::new())
            .await;

        assert!(response.is_confirmation_required());
        assert!(!tracker.confirm(stolen.as_str()));
        assert_eq!(tool.executions(), 0);
    }
}
