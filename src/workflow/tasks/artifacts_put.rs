// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::ArtifactStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, flag, optional_str, required_str, DisplayInfo, ValidationReport, WorkflowTask,
};

static ARTIFACTS_PUT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "description": "The artifact key, slash-separated"
            },
            "content": {
                "description": "The content to store; objects require stringify_json"
            },
            "content_type": {
                "type": "string",
                "description": "Explicit content type; inferred when absent"
            },
            "stringify_json": {
                "type": "boolean",
                "description": "Serialize an object content value to JSON text first"
            }
        },
        "required": ["key", "content"]
    })
});

/// Stores one artifact in the object store.
///
/// Content type resolution order: explicit field, file extension,
/// JSON-parseability, then `application/octet-stream`.
pub struct ArtifactsPutTask {
    artifacts: Arc<dyn ArtifactStore>,
}

impl ArtifactsPutTask {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

fn content_type_for_extension(key: &str) -> Option<&'static str> {
    let extension = key.rsplit('.').next()?;
    match extension {
        "json" => Some("application/json"),
        "txt" | "log" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "css" => Some("text/css"),
        "csv" => Some("text/csv"),
        "md" => Some("text/markdown"),
        "xml" => Some("application/xml"),
        "yaml" | "yml" => Some("application/yaml"),
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Infer the content type when the caller did not supply one
pub(super) fn infer_content_type(key: &str, content: &str) -> &'static str {
    if let Some(by_extension) = content_type_for_extension(key) {
        return by_extension;
    }
    if serde_json::from_str::<Value>(content).is_ok() {
        return "application/json";
    }
    "application/octet-stream"
}

#[async_trait]
impl WorkflowTask for ArtifactsPutTask {
    fn task_type(&self) -> &str {
        "artifacts-put"
    }

    fn schema(&self) -> &Value {
        &ARTIFACTS_PUT_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("Artifacts Put", "storage", "Store an artifact in the object store")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        report.require_string(input, "key");
        match input.get("content") {
            None | Some(Value::Null) => {
                report.error("Missing required field 'content'");
            }
            Some(Value::String(_)) => {}
            Some(_) if flag(input, "stringify_json") => {}
            Some(_) => {
                report.warning("Non-string 'content' requires 'stringify_json' to be set");
            }
        }
        report
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let key = required_str(&input, "key")?.to_string();

        let content_value = input
            .get("content")
            .filter(|v| !v.is_null())
            .ok_or(TaskError::MissingField("content"))?;

        let content = match content_value {
            Value::String(text) => text.clone(),
            other if flag(&input, "stringify_json") => serde_json::to_string(other)?,
            other => {
                return Err(TaskError::invalid_field(
                    "content",
                    format!("expected a string, got {}; set stringify_json for objects", other),
                ))
            }
        };

        let content_type = match optional_str(&input, "content_type") {
            Some(explicit) => explicit.to_string(),
            None => infer_content_type(&key, &content).to_string(),
        };

        let stored = self
            .artifacts
            .put(&key, content.into_bytes(), &content_type)
            .await?;

        let mut output = base_output();
        output.insert("key".to_string(), Value::String(stored.key));
        output.insert("url".to_string(), Value::String(stored.url));
        output.insert("size".to_string(), json!(stored.size));
        output.insert("content_type".to_string(), Value::String(content_type));
        Ok(Value::Object(output))
    }
}
