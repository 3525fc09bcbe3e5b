// SPDX-License-Identifier: MIT

//! JSON-RPC envelope types for the tool-call bridge
//!
//! Wire-compatible with MCP clients: `initialize`, `tools/list`,
//! `tools/call`, and notification handling. Requests without an id are
//! notifications and receive no response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::HandlerError;

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "agent-mesh";

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

impl McpRequest {
    /// Notifications carry no id and get no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpErrorResponse>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<McpError> for McpErrorResponse {
    fn from(error: McpError) -> Self {
        let (code, message) = match error {
            McpError::InvalidRequest(msg) => (-32600, format!("Invalid Request: {}", msg)),
            McpError::MethodNotFound(method) => (-32601, format!("Method not found: {}", method)),
            McpError::Handler(err) => (-32003, format!("Handler error: {}", err)),
            McpError::Internal(msg) => (-32603, format!("Internal error: {}", msg)),
        };

        Self {
            code,
            message,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parses_envelope() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "kv_get", "arguments": {"key": "k"}}
        });
        let request: McpRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.method, "tools/call");
        assert!(!request.is_notification());
    }

    #[test]
    fn test_notification_has_no_id() {
        let raw = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let request: McpRequest = serde_json::from_value(raw).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn test_error_code_mapping() {
        let response: McpErrorResponse = McpError::MethodNotFound("x/y".to_string()).into();
        assert_eq!(response.code, -32601);

        let response: McpErrorResponse =
            McpError::Handler(HandlerError::InvalidArguments("bad".to_string())).into();
        assert_eq!(response.code, -32003);

        let response: McpErrorResponse = McpError::InvalidRequest("no".to_string()).into();
        assert_eq!(response.code, -32600);
    }

    #[test]
    fn test_success_response_omits_error() {
        let response = McpResponse::success(Some(json!(7)), json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], 7);
        assert!(value.get("error").is_none());
        assert_eq!(value["result"]["ok"], true);
    }
}
