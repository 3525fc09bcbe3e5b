// SPDX-License-Identifier: MIT

//! Tool handlers behind the JSON-RPC bridge
//!
//! Each handler wraps one service operation; the registry is the dispatch
//! table `tools/call` routes through.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HandlerError;
use crate::store::{ArtifactStore as _, EventBus as _, KvStore as _, Services};
use crate::workflow::{RunTracker, WorkflowDefinition, WorkflowEngine};

/// A single named tool exposed over the bridge
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Tool description plus input schema, merged with the name at list time
    fn tool_schema(&self) -> Value;

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError>;
}

/// Dispatch table mapping tool names to handlers
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl HandlerRegistry {
    pub fn new(services: Services, engine: WorkflowEngine, runs: RunTracker) -> Self {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();

        let install: Vec<Arc<dyn ToolHandler>> = vec![
            Arc::new(KvGetHandler::new(services.clone())),
            Arc::new(KvSetHandler::new(services.clone())),
            Arc::new(ArtifactsGetHandler::new(services.clone())),
            Arc::new(ArtifactsPutHandler::new(services.clone())),
            Arc::new(ArtifactsListHandler::new(services.clone())),
            Arc::new(EventsSendHandler::new(services)),
            Arc::new(WorkflowStartHandler::new(engine, runs.clone())),
            Arc::new(WorkflowStatusHandler::new(runs)),
        ];

        for handler in install {
            handlers.insert(handler.name().to_string(), handler);
        }

        Self { handlers }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Tool listing for `tools/list`, sorted by name
    pub fn list_tools(&self) -> Vec<Value> {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let mut schema = self.handlers[name].tool_schema();
                if let Value::Object(ref mut tool) = schema {
                    tool.insert("name".to_string(), Value::String(name.clone()));
                }
                schema
            })
            .collect()
    }

    pub async fn call(&self, tool_name: &str, arguments: Value) -> Result<Value, HandlerError> {
        let handler = self
            .handlers
            .get(tool_name)
            .ok_or_else(|| HandlerError::NotFound(tool_name.to_string()))?;

        log::debug!("Executing tool '{}'", tool_name);
        handler.handle(arguments).await
    }
}

fn required_arg_str<'a>(arguments: &'a Value, name: &str) -> Result<&'a str, HandlerError> {
    arguments
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerError::InvalidArguments(format!("Missing '{}' parameter", name)))
}

// --- KV handlers ---

pub struct KvGetHandler {
    services: Services,
}

impl KvGetHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for KvGetHandler {
    fn name(&self) -> &str {
        "kv_get"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Get a value from the key-value store",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "The key to retrieve"
                    }
                },
                "required": ["key"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let key = required_arg_str(&arguments, "key")?;

        match self.services.kv.get(key).await? {
            Some(entry) => Ok(json!({"value": entry.value, "exists": true})),
            None => Ok(json!({"value": null, "exists": false})),
        }
    }
}

pub struct KvSetHandler {
    services: Services,
}

impl KvSetHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for KvSetHandler {
    fn name(&self) -> &str {
        "kv_set"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Set a value in the key-value store",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "The key to set"
                    },
                    "value": {
                        "description": "The value to store"
                    },
                    "ttl_hours": {
                        "type": "number",
                        "description": "Optional time to live in hours"
                    }
                },
                "required": ["key", "value"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let key = required_arg_str(&arguments, "key")?;
        let value = arguments
            .get("value")
            .cloned()
            .filter(|v| !v.is_null())
            .ok_or_else(|| HandlerError::InvalidArguments("Missing 'value' parameter".to_string()))?;
        let ttl_hours = arguments
            .get("ttl_hours")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        self.services.kv.set(key, value, ttl_hours).await?;
        Ok(json!({"success": true}))
    }
}

// --- Artifact handlers ---

pub struct ArtifactsGetHandler {
    services: Services,
}

impl ArtifactsGetHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for ArtifactsGetHandler {
    fn name(&self) -> &str {
        "artifacts_get"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Get an artifact by key",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "The artifact key to retrieve"
                    }
                },
                "required": ["key"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let key = required_arg_str(&arguments, "key")?;

        match self.services.artifacts.get(key).await? {
            Some(artifact) => Ok(json!({
                "content": general_purpose::STANDARD.encode(&artifact.content),
                "encoding": "base64",
                "content_type": artifact.content_type
            })),
            None => Ok(json!({"content": null})),
        }
    }
}

pub struct ArtifactsPutHandler {
    services: Services,
}

impl ArtifactsPutHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for ArtifactsPutHandler {
    fn name(&self) -> &str {
        "artifacts_put"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Store an artifact",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "The artifact key"
                    },
                    "content": {
                        "type": "string",
                        "description": "The artifact content (base64 encoded)"
                    },
                    "content_type": {
                        "type": "string",
                        "description": "The content type (default: text/plain)"
                    }
                },
                "required": ["key", "content"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let key = required_arg_str(&arguments, "key")?;
        let content = required_arg_str(&arguments, "content")?;
        let content_type = arguments
            .get("content_type")
            .and_then(|v| v.as_str())
            .unwrap_or("text/plain");

        let decoded = general_purpose::STANDARD
            .decode(content)
            .map_err(|err| HandlerError::InvalidArguments(format!("Invalid base64 content: {}", err)))?;

        let stored = self.services.artifacts.put(key, decoded, content_type).await?;
        Ok(json!({"success": true, "url": stored.url, "size": stored.size}))
    }
}

pub struct ArtifactsListHandler {
    services: Services,
}

impl ArtifactsListHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for ArtifactsListHandler {
    fn name(&self) -> &str {
        "artifacts_list"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "List artifacts with optional prefix",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prefix": {
                        "type": "string",
                        "description": "Optional prefix to filter artifacts"
                    }
                }
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let prefix = arguments.get("prefix").and_then(|v| v.as_str());
        let items = self.services.artifacts.list(prefix).await?;
        Ok(json!({
            "keys": items.iter().map(|item| item.key.clone()).collect::<Vec<_>>(),
            "items": items
        }))
    }
}

// --- Event handler ---

pub struct EventsSendHandler {
    services: Services,
}

impl EventsSendHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ToolHandler for EventsSendHandler {
    fn name(&self) -> &str {
        "events_send"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Send an event to the event bus",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "detailType": {
                        "type": "string",
                        "description": "The event type"
                    },
                    "detail": {
                        "type": "object",
                        "description": "The event payload"
                    },
                    "source": {
                        "type": "string",
                        "description": "The event source (default: agent-mesh)"
                    }
                },
                "required": ["detailType", "detail"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let detail_type = required_arg_str(&arguments, "detailType")?;
        let detail = arguments
            .get("detail")
            .cloned()
            .ok_or_else(|| HandlerError::InvalidArguments("Missing 'detail' parameter".to_string()))?;
        let source = arguments
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("agent-mesh");

        let event = self.services.events.send(detail_type, detail, source).await?;
        Ok(json!({"success": true, "eventId": event.event_id}))
    }
}

// --- Workflow handlers ---

pub struct WorkflowStartHandler {
    engine: WorkflowEngine,
    runs: RunTracker,
}

impl WorkflowStartHandler {
    pub fn new(engine: WorkflowEngine, runs: RunTracker) -> Self {
        Self { engine, runs }
    }
}

#[async_trait]
impl ToolHandler for WorkflowStartHandler {
    fn name(&self) -> &str {
        "workflow_start"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Start a workflow execution in the background",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workflow": {
                        "type": "object",
                        "description": "The workflow definition (nodes + connections)"
                    }
                },
                "required": ["workflow"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let raw = arguments
            .get("workflow")
            .cloned()
            .ok_or_else(|| HandlerError::InvalidArguments("Missing 'workflow' parameter".to_string()))?;

        let definition: WorkflowDefinition = serde_json::from_value(raw)
            .map_err(|err| HandlerError::InvalidArguments(format!("Invalid workflow definition: {}", err)))?;

        let run_id = self.runs.start(self.engine.clone(), definition).await;
        Ok(json!({"runId": run_id, "status": "running"}))
    }
}

pub struct WorkflowStatusHandler {
    runs: RunTracker,
}

impl WorkflowStatusHandler {
    pub fn new(runs: RunTracker) -> Self {
        Self { runs }
    }
}

#[async_trait]
impl ToolHandler for WorkflowStatusHandler {
    fn name(&self) -> &str {
        "workflow_status"
    }

    fn tool_schema(&self) -> Value {
        json!({
            "description": "Get the status of a workflow run",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "runId": {
                        "type": "string",
                        "description": "The run id returned by workflow_start"
                    }
                },
                "required": ["runId"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Value, HandlerError> {
        let raw = required_arg_str(&arguments, "runId")?;
        let run_id = Uuid::parse_str(raw)
            .map_err(|err| HandlerError::InvalidArguments(format!("Invalid runId: {}", err)))?;

        match self.runs.status(&run_id).await {
            Some(snapshot) => {
                Ok(serde_json::to_value(snapshot).map_err(|err| HandlerError::Internal(err.to_string()))?)
            }
            None => Err(HandlerError::NotFound(format!("run {}", run_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::registry::TaskRegistry;
    use crate::workflow::tasks::register_all_tasks;
    use crate::workflow::RunStatus;

    async fn registry() -> (HandlerRegistry, Services) {
        let services = Services::in_memory();
        let tasks = TaskRegistry::new();
        register_all_tasks(&tasks, &services).await;
        let engine = WorkflowEngine::new(tasks);
        let registry = HandlerRegistry::new(services.clone(), engine, RunTracker::new());
        (registry, services)
    }

    #[tokio::test]
    async fn test_list_tools_carries_names() {
        let (registry, _) = registry().await;
        let tools = registry.list_tools();

        assert_eq!(tools.len(), 8);
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "artifacts_get",
                "artifacts_list",
                "artifacts_put",
                "events_send",
                "kv_get",
                "kv_set",
                "workflow_start",
                "workflow_status",
            ]
        );
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_kv_round_trip_through_handlers() {
        let (registry, _) = registry().await;

        let result = registry
            .call("kv_set", json!({"key": "greeting", "value": {"hi": true}}))
            .await
            .unwrap();
        assert_eq!(result["success"], true);

        let result = registry.call("kv_get", json!({"key": "greeting"})).await.unwrap();
        assert_eq!(result["exists"], true);
        assert_eq!(result["value"], json!({"hi": true}));
    }

    #[tokio::test]
    async fn test_kv_get_missing_key() {
        let (registry, _) = registry().await;
        let result = registry.call("kv_get", json!({"key": "nope"})).await.unwrap();
        assert_eq!(result["exists"], false);
        assert_eq!(result["value"], Value::Null);
    }

    #[tokio::test]
    async fn test_artifacts_base64_round_trip() {
        let (registry, _) = registry().await;

        let encoded = general_purpose::STANDARD.encode(b"report body");
        registry
            .call(
                "artifacts_put",
                json!({"key": "r.txt", "content": encoded, "content_type": "text/plain"}),
            )
            .await
            .unwrap();

        let result = registry.call("artifacts_get", json!({"key": "r.txt"})).await.unwrap();
        assert_eq!(result["encoding"], "base64");
        let decoded = general_purpose::STANDARD
            .decode(result["content"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"report body");
    }

    #[tokio::test]
    async fn test_artifacts_put_rejects_bad_base64() {
        let (registry, _) = registry().await;
        let err = registry
            .call("artifacts_put", json!({"key": "k", "content": "%%%not-base64"}))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_events_send_returns_event_id() {
        let (registry, services) = registry().await;

        let result = registry
            .call(
                "events_send",
                json!({"detailType": "report.ready", "detail": {"rows": 5}}),
            )
            .await
            .unwrap();
        assert_eq!(result["success"], true);
        assert!(result["eventId"].is_string());

        let recent = services.events.recent().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].detail_type, "report.ready");
    }

    #[tokio::test]
    async fn test_workflow_start_and_status() {
        let (registry, _) = registry().await;

        let result = registry
            .call(
                "workflow_start",
                json!({"workflow": {
                    "name": "probe",
                    "nodes": [{"id": "t", "type": "trigger"}],
                    "connections": []
                }}),
            )
            .await
            .unwrap();
        let run_id = result["runId"].as_str().unwrap().to_string();

        // Poll until the background run finishes
        let mut status = json!(null);
        for _ in 0..50 {
            status = registry
                .call("workflow_status", json!({"runId": run_id}))
                .await
                .unwrap();
            if status["status"] != json!(RunStatus::Running) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(status["status"], "completed");
        assert_eq!(status["result"]["nodes_executed"], 1);
        assert_eq!(status["result"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_unknown_tool_not_found() {
        let (registry, _) = registry().await;
        let err = registry.call("ghost_tool", json!({})).await.unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_workflow_status_unknown_run() {
        let (registry, _) = registry().await;
        let err = registry
            .call(
                "workflow_status",
                json!({"runId": "00000000-0000-0000-0000-000000000000"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }
}
