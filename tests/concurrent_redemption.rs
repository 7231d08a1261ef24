//! Integration tests for token redemption under concurrency and binding.
//!
//! Many tasks race to redeem one token through the full dispatcher; exactly
//! one must execute the operation and every other must be prompted again.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use hostgate::adapters::audit::InMemoryAuditSink;
use hostgate::adapters::simulated::SimulatedHost;
use hostgate::application::{GateSettings, HostPorts, ToolCatalog, ToolDispatcher};
use hostgate::domain::confirmation::{ConfirmationPolicy, TokenBinding};
use hostgate::domain::tools::ToolCall;
use hostgate::ports::{AuditSink, OperationContext};

const RACERS: usize = 32;

fn build(host: Arc<SimulatedHost>, sink: Arc<InMemoryAuditSink>, policy: ConfirmationPolicy) -> ToolCatalog {
    let audit: Arc<dyn AuditSink> = sink;
    let settings = GateSettings {
        policy,
        audit: Some(audit),
        ..Default::default()
    };
    ToolCatalog::build(&HostPorts::from_host(host), &settings).unwrap()
}

async fn prompt_token(dispatcher: &ToolDispatcher, name: &str, arguments: serde_json::Value) -> String {
    dispatcher
        .dispatch(&ToolCall::new(name, arguments), &OperationContext::new())
        .await
        .confirmation_token
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemption_executes_exactly_once() {
    let host = Arc::new(SimulatedHost::seeded().with_latency(Duration::from_millis(2)));
    let sink = Arc::new(InMemoryAuditSink::new());
    let catalog = build(host.clone(), sink.clone(), ConfirmationPolicy::default());
    let dispatcher = Arc::new(catalog.dispatcher);

    let token = prompt_token(&dispatcher, "notifications", json!({ "action": "delete_all" })).await;

    let mut handles = Vec::with_capacity(RACERS);
    for _ in 0..RACERS {
        let dispatcher = dispatcher.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let call = ToolCall::new(
                "notifications",
                json!({ "action": "delete_all", "confirmation_token": token }),
            );
            dispatcher.dispatch(&call, &OperationContext::new()).await
        }));
    }

    let mut executed = 0;
    let mut prompted = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if response.is_success() {
            executed += 1;
        } else if response.is_confirmation_required() {
            prompted += 1;
        }
    }

    assert_eq!(executed, 1);
    assert_eq!(prompted, RACERS - 1);
    assert_eq!(sink.len(), 1);
    assert_eq!(host.notification_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unrelated_groups_do_not_share_tokens() {
    let host = Arc::new(SimulatedHost::seeded());
    let sink = Arc::new(InMemoryAuditSink::new());
    let catalog = build(host, sink.clone(), ConfirmationPolicy::default());

    // Issued by the notifications tracker, presented to the vm tracker.
    let token = prompt_token(&catalog.dispatcher, "notifications", json!({ "action": "delete_all" })).await;
    let response = catalog
        .dispatcher
        .dispatch(
            &ToolCall::new("vm_delete", json!({ "vm_id": "vm-2", "confirmation_token": token })),
            &OperationContext::new(),
        )
        .await;

    assert!(response.is_confirmation_required());
    assert!(sink.is_empty());
    assert_eq!(catalog.tracker("notifications").unwrap().pending_count(), 1);
}

#[tokio::test]
async fn unbound_tokens_cross_resources_within_a_group() {
    let host = Arc::new(SimulatedHost::seeded());
    let sink = Arc::new(InMemoryAuditSink::new());
    let catalog = build(host.clone(), sink, ConfirmationPolicy::default());

    let token = prompt_token(
        &catalog.dispatcher,
        "notifications",
        json!({ "action": "archive", "notification_id": "1" }),
    )
    .await;
    let response = catalog
        .dispatcher
        .dispatch(
            &ToolCall::new(
                "notifications",
                json!({ "action": "delete", "notification_id": "2", "confirmation_token": token }),
            ),
            &OperationContext::new(),
        )
        .await;

    assert!(response.is_success(), "{}", response.message);
    assert_eq!(host.notification_count().await, 2);
}

#[tokio::test]
async fn bound_tokens_are_burned_on_mismatch() {
    let host = Arc::new(SimulatedHost::seeded());
    let sink = Arc::new(InMemoryAuditSink::new());
    let policy = ConfirmationPolicy::default().with_binding(TokenBinding::BoundToRequest);
    let catalog = build(host.clone(), sink.clone(), policy);

    let token = prompt_token(
        &catalog.dispatcher,
        "notifications",
        json!({ "action": "archive", "notification_id": "1" }),
    )
    .await;

    let misused = catalog
        .dispatcher
        .dispatch(
            &ToolCall::new(
                "notifications",
                json!({ "action": "delete", "notification_id": "2", "confirmation_token": token.clone() }),
            ),
            &OperationContext::new(),
        )
        .await;
    let original = catalog
        .dispatcher
        .dispatch(
            &ToolCall::new(
                "notifications",
                json!({ "action": "archive", "notification_id": "1", "confirmation_token": token }),
            ),
            &OperationContext::new(),
        )
        .await;

    assert!(misused.is_confirmation_required());
    assert!(original.is_confirmation_required());
    assert!(sink.is_empty());
    assert_eq!(host.notification_count().await, 3);
}

#[tokio::test]
async fn bound_token_redeems_for_its_own_request() {
    let host = Arc::new(SimulatedHost::seeded());
    let sink = Arc::new(InMemoryAuditSink::new());
    let policy = ConfirmationPolicy::default().with_binding(TokenBinding::BoundToRequest);
    let catalog = build(host.clone(), sink.clone(), policy);
    let arguments = json!({ "vm_id": "vm-2" });

    let token = prompt_token(&catalog.dispatcher, "vm_delete", arguments.clone()).await;
    let mut confirmed = arguments;
    confirmed["confirmation_token"] = json!(token);
    let response = catalog
        .dispatcher
        .dispatch(&ToolCall::new("vm_delete", confirmed), &OperationContext::new())
        .await;

    assert!(response.is_success(), "{}", response.message);
    assert!(host.vm("vm-2").await.is_none());
    assert_eq!(sink.records_for("vm_delete").len(), 1);
}
