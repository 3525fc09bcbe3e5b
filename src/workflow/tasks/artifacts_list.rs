// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::ArtifactStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{base_output, optional_str, DisplayInfo, ValidationReport, WorkflowTask};

static ARTIFACTS_LIST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "prefix": {
                "type": "string",
                "description": "Optional key prefix to filter by"
            }
        }
    })
});

/// Lists artifacts in the object store, optionally filtered by prefix
pub struct ArtifactsListTask {
    artifacts: Arc<dyn ArtifactStore>,
}

impl ArtifactsListTask {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl WorkflowTask for ArtifactsListTask {
    fn task_type(&self) -> &str {
        "artifacts-list"
    }

    fn schema(&self) -> &Value {
        &ARTIFACTS_LIST_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("Artifacts List", "storage", "List artifacts in the object store")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if let Some(prefix) = input.get("prefix") {
            if !prefix.is_string() && !prefix.is_null() {
                report.error("Field 'prefix' must be a string");
            }
        }
        report
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let prefix = optional_str(&input, "prefix");
        let items = self.artifacts.list(prefix).await?;

        let mut output = base_output();
        output.insert("count".to_string(), json!(items.len()));
        output.insert("items".to_string(), serde_json::to_value(items)?);
        Ok(Value::Object(output))
    }
}
