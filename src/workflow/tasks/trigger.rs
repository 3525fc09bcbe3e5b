// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::TaskError;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{base_output, DisplayInfo, ValidationReport, WorkflowTask};

static TRIGGER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": true
    })
});

/// Entry-point marker task.
///
/// Performs no external call; echoes its input fields into the output so a
/// trigger payload can be routed downstream.
pub struct TriggerTask;

impl TriggerTask {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TriggerTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowTask for TriggerTask {
    fn task_type(&self) -> &str {
        "trigger"
    }

    fn schema(&self) -> &Value {
        &TRIGGER_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("Trigger", "core", "Starts a workflow run")
    }

    fn validate(&self, _input: &Value) -> ValidationReport {
        ValidationReport::ok()
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let mut output = base_output();
        if let Value::Object(fields) = input {
            for (key, value) in fields {
                output.entry(key).or_insert(value);
            }
        }
        output.insert("triggered".to_string(), Value::Bool(true));
        Ok(Value::Object(output))
    }
}
