//! Integration tests for workflow loading and execution
//!
//! These tests wire the real task set, in-memory service stores, the engine,
//! and the MCP bridge together end-to-end.

use serde_json::{json, Value};
use std::sync::Arc;

use agent_mesh::mcp::{HandlerRegistry, McpBridge, McpRequest};
use agent_mesh::store::{EventBus as _, KvStore as _, Services};
use agent_mesh::workflow::tasks::register_all_tasks;
use agent_mesh::workflow::{
    RunTracker, TaskRegistry, WorkflowDefinition, WorkflowEngine, WorkflowLoader, WorkflowStatus,
};

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    services: Services,
    engine: WorkflowEngine,
}

async fn harness() -> Harness {
    let services = Services::in_memory();
    let registry = TaskRegistry::new();
    register_all_tasks(&registry, &services).await;
    Harness {
        services,
        engine: WorkflowEngine::new(registry),
    }
}

fn definition(raw: Value) -> WorkflowDefinition {
    serde_json::from_value(raw).expect("valid definition")
}

// ============================================================================
// Engine end-to-end
// ============================================================================

#[tokio::test]
async fn trigger_then_kv_set_persists_the_exact_object() {
    let h = harness().await;

    let def = definition(json!({
        "name": "daily-summary",
        "nodes": [
            {"id": "trigger-1", "type": "trigger"},
            {"id": "kv-set-1", "type": "kv-set", "config": {
                "key": "daily-summary",
                "value": {"date": "2026-08-06", "total": 42}
            }}
        ],
        "connections": [
            {"from": "trigger-1", "to": "kv-set-1",
             "fromOutput": "triggered", "toInput": "fired"}
        ]
    }));

    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.nodes_executed, 2);
    assert_eq!(result.results["kv-set-1"]["success"], true);

    let entry = h.services.kv.get("daily-summary").await.unwrap().unwrap();
    assert_eq!(entry.value, json!({"date": "2026-08-06", "total": 42}));
}

#[tokio::test]
async fn kv_set_output_feeds_kv_get_through_connection() {
    let h = harness().await;
    h.services.kv.set("source", json!("payload"), None).await.unwrap();

    // kv-get-2 reads the key that kv-set-1 reports having written
    let def = definition(json!({
        "name": "chain",
        "nodes": [
            {"id": "kv-set-1", "type": "kv-set", "config": {"key": "relay", "value": "hello"}},
            {"id": "kv-get-2", "type": "kv-get", "config": {}}
        ],
        "connections": [
            {"from": "kv-set-1", "to": "kv-get-2", "fromOutput": "key", "toInput": "key"}
        ]
    }));

    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results["kv-get-2"]["key"], "relay");
    assert_eq!(result.results["kv-get-2"]["value"], "hello");
    assert_eq!(result.results["kv-get-2"]["exists"], true);
}

#[tokio::test]
async fn artifacts_stringify_then_get_deep_equals() {
    let h = harness().await;

    let original = json!({"report": {"rows": [1, 2, 3], "done": true}});
    let def = definition(json!({
        "name": "artifact-round-trip",
        "nodes": [
            {"id": "put-1", "type": "artifacts-put", "config": {
                "key": "out/report.json",
                "content": original,
                "stringify_json": true
            }},
            {"id": "get-1", "type": "artifacts-get", "config": {
                "key": "out/report.json",
                "parse_json": true
            }}
        ],
        "connections": [
            {"from": "put-1", "to": "get-1", "fromOutput": "success", "toInput": "upstream_ok"}
        ]
    }));

    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results["get-1"]["found"], true);
    assert_eq!(result.results["get-1"]["content"], original);
}

#[tokio::test]
async fn cache_set_get_and_clear() {
    let h = harness().await;

    let def = definition(json!({
        "name": "cache-flow",
        "nodes": [
            {"id": "set-1", "type": "cache", "config": {"op": "set", "key": "t", "value": 9}},
            {"id": "get-1", "type": "cache", "config": {"op": "get", "key": "t"}},
            {"id": "miss-1", "type": "cache", "config": {"op": "get", "key": "never-set"}},
            {"id": "clear-1", "type": "cache", "config": {"op": "clear"}}
        ],
        "connections": [
            {"from": "set-1", "to": "get-1", "fromOutput": "success", "toInput": "after"},
            {"from": "get-1", "to": "miss-1", "fromOutput": "success", "toInput": "after"},
            {"from": "miss-1", "to": "clear-1", "fromOutput": "success", "toInput": "after"}
        ]
    }));

    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results["get-1"]["found"], true);
    assert_eq!(result.results["get-1"]["value"], 9);
    assert_eq!(result.results["miss-1"]["found"], false);
    assert_eq!(result.results["clear-1"]["cleared"], 1);
}

#[tokio::test]
async fn unregistered_type_fails_but_keeps_predecessor_results() {
    let h = harness().await;

    let def = definition(json!({
        "name": "broken",
        "nodes": [
            {"id": "t", "type": "trigger"},
            {"id": "x", "type": "ga-report"},
            {"id": "after", "type": "trigger"}
        ],
        "connections": [
            {"from": "t", "to": "x", "fromOutput": "triggered", "toInput": "fired"},
            {"from": "x", "to": "after", "fromOutput": "success", "toInput": "fired"}
        ]
    }));

    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.error.unwrap().contains("ga-report"));
    assert!(result.results.contains_key("t"));
    assert!(!result.results.contains_key("x"));
    assert!(!result.results.contains_key("after"));
    assert_eq!(result.nodes_executed, 1);
}

#[tokio::test]
async fn loader_round_trips_yaml_definition() {
    let yaml = r#"
name: from-disk
nodes:
  - id: trigger-1
    type: trigger
  - id: list-1
    type: artifacts-list
    config:
      prefix: "reports/"
connections:
  - from: trigger-1
    to: list-1
    fromOutput: triggered
    toInput: fired
"#;
    let def = WorkflowLoader::parse_yaml(yaml).unwrap();

    let h = harness().await;
    let result = h.engine.execute(&def).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.results["list-1"]["count"], 0);
}

// ============================================================================
// MCP bridge end-to-end
// ============================================================================

async fn bridge() -> (McpBridge, Services) {
    let services = Services::in_memory();
    let registry = TaskRegistry::new();
    register_all_tasks(&registry, &services).await;
    let engine = WorkflowEngine::new(registry);
    let handlers = HandlerRegistry::new(services.clone(), engine, RunTracker::new());
    (McpBridge::new(Arc::new(handlers)), services)
}

fn rpc(id: i64, method: &str, params: Value) -> McpRequest {
    McpRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(id)),
        method: method.to_string(),
        params: Some(params),
    }
}

fn unwrap_text_content(result: &Value) -> Value {
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn mcp_kv_round_trip() {
    let (bridge, _) = bridge().await;

    let response = bridge
        .handle(rpc(
            1,
            "tools/call",
            json!({"name": "kv_set", "arguments": {"key": "cfg", "value": {"on": true}}}),
        ))
        .await
        .unwrap();
    let inner = unwrap_text_content(&response.result.unwrap());
    assert_eq!(inner["success"], true);

    let response = bridge
        .handle(rpc(
            2,
            "tools/call",
            json!({"name": "kv_get", "arguments": {"key": "cfg"}}),
        ))
        .await
        .unwrap();
    let inner = unwrap_text_content(&response.result.unwrap());
    assert_eq!(inner["value"], json!({"on": true}));
}

#[tokio::test]
async fn mcp_workflow_start_reaches_completion() {
    let (bridge, services) = bridge().await;

    let response = bridge
        .handle(rpc(
            1,
            "tools/call",
            json!({"name": "workflow_start", "arguments": {"workflow": {
                "name": "bg",
                "nodes": [
                    {"id": "t", "type": "trigger"},
                    {"id": "w", "type": "kv-set",
                     "config": {"key": "bg-out", "value": "done"}}
                ],
                "connections": [
                    {"from": "t", "to": "w", "fromOutput": "triggered", "toInput": "fired"}
                ]
            }}}),
        ))
        .await
        .unwrap();

    let started = unwrap_text_content(&response.result.unwrap());
    let run_id = started["runId"].as_str().unwrap().to_string();

    // Poll workflow_status until the background run lands
    let mut status = json!(null);
    for _ in 0..100 {
        let response = bridge
            .handle(rpc(
                2,
                "tools/call",
                json!({"name": "workflow_status", "arguments": {"runId": run_id}}),
            ))
            .await
            .unwrap();
        status = unwrap_text_content(&response.result.unwrap());
        if status["status"] != "running" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(status["status"], "completed");
    assert_eq!(status["result"]["nodes_executed"], 2);

    // The background run's side effect is visible through the shared store
    let entry = services.kv.get("bg-out").await.unwrap().unwrap();
    assert_eq!(entry.value, "done");
}

#[tokio::test]
async fn mcp_events_send_reaches_subscribers() {
    let (bridge, services) = bridge().await;
    let mut rx = services.events.subscribe();

    bridge
        .handle(rpc(
            1,
            "tools/call",
            json!({"name": "events_send", "arguments": {
                "detailType": "workflow.completed",
                "detail": {"name": "daily"}
            }}),
        ))
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.detail_type, "workflow.completed");
    assert_eq!(event.detail, json!({"name": "daily"}));
    assert_eq!(event.source, "agent-mesh");
}

// ============================================================================
// Advisory validation
// ============================================================================

#[tokio::test]
async fn artifacts_put_validation_names_missing_key() {
    let services = Services::in_memory();
    let registry = TaskRegistry::new();
    register_all_tasks(&registry, &services).await;

    let task = registry.resolve("artifacts-put").await.unwrap();
    let report = task.validate(&json!({"content": "body"}));

    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("'key'")));
}

#[tokio::test]
async fn validation_is_advisory_engine_still_runs() {
    // The engine does not call validate(); a config that validation would
    // reject still reaches execute() and fails there instead.
    let h = harness().await;

    let def = definition(json!({
        "name": "advisory",
        "nodes": [{"id": "p", "type": "artifacts-put", "config": {"content": "x"}}],
        "connections": []
    }));

    let result = h.engine.execute(&def).await;
    assert_eq!(result.status, WorkflowStatus::Failed);
    assert!(result.error.unwrap().contains("key"));
}
