// SPDX-License-Identifier: MIT

//! MCP tool-calling bridge
//!
//! Dispatches JSON-RPC envelopes (`initialize`, `tools/list`, `tools/call`)
//! onto the handler registry. Tool results are wrapped as MCP text content
//! blocks.

pub mod protocol;
pub mod tools;

pub use protocol::{McpError, McpErrorResponse, McpRequest, McpResponse};
pub use tools::{HandlerRegistry, ToolHandler};

use serde_json::{json, Value};
use std::sync::Arc;

/// The served side of the tool-call bridge
pub struct McpBridge {
    handlers: Arc<HandlerRegistry>,
}

impl McpBridge {
    pub fn new(handlers: Arc<HandlerRegistry>) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Handle one request. Notifications return `None` and get no response.
    pub async fn handle(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            log::debug!("Received notification: {}", request.method);
            return None;
        }

        let id = request.id.clone();
        let outcome = self.process(request).await;

        Some(match outcome {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse::failure(id, error),
        })
    }

    async fn process(&self, request: McpRequest) -> Result<Value, McpError> {
        log::debug!("Processing request: {}", request.method);

        match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "tools/list" => Ok(json!({"tools": self.handlers.list_tools()})),
            "tools/call" => self.tool_call(request.params).await,
            "notifications/initialized" => Ok(Value::Null),
            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": protocol::PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": protocol::SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn tool_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params =
            params.ok_or_else(|| McpError::InvalidRequest("Missing parameters".to_string()))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidRequest("Missing tool name".to_string()))?;

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        let result = self.handlers.call(tool_name, arguments).await?;

        // Wrap the handler's JSON result as a text content block
        let text = serde_json::to_string(&result)
            .map_err(|err| McpError::Internal(err.to_string()))?;
        Ok(json!({
            "content": [{
                "type": "text",
                "text": text
            }]
        }))
    }
}
