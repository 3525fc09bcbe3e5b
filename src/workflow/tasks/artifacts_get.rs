// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::ArtifactStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, flag, required_str, DisplayInfo, ValidationReport, WorkflowTask,
};

static ARTIFACTS_GET_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "description": "The artifact key to retrieve"
            },
            "parse_json": {
                "type": "boolean",
                "description": "Parse the content as JSON before returning it"
            }
        },
        "required": ["key"]
    })
});

/// Retrieves one artifact from the object store.
///
/// Content is returned as text; with `parse_json` (or a JSON content type)
/// it is re-parsed into a structured value.
pub struct ArtifactsGetTask {
    artifacts: Arc<dyn ArtifactStore>,
}

impl ArtifactsGetTask {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl WorkflowTask for ArtifactsGetTask {
    fn task_type(&self) -> &str {
        "artifacts-get"
    }

    fn schema(&self) -> &Value {
        &ARTIFACTS_GET_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("Artifacts Get", "storage", "Read an artifact from the object store")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        report.require_string(input, "key");
        report
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let key = required_str(&input, "key")?;

        let mut output = base_output();
        output.insert("key".to_string(), Value::String(key.to_string()));

        let Some(artifact) = self.artifacts.get(key).await? else {
            output.insert("found".to_string(), Value::Bool(false));
            output.insert("content".to_string(), Value::Null);
            return Ok(Value::Object(output));
        };

        let text = String::from_utf8_lossy(&artifact.content).into_owned();
        let parse = flag(&input, "parse_json") || artifact.content_type == "application/json";
        let content = if parse {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        output.insert("found".to_string(), Value::Bool(true));
        output.insert("content".to_string(), content);
        output.insert(
            "content_type".to_string(),
            Value::String(artifact.content_type),
        );
        Ok(Value::Object(output))
    }
}
