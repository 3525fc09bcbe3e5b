// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::KvStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, flag, optional_str, DisplayInfo, ValidationReport, WorkflowTask,
};

static KV_GET_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "description": "The key to read"
            },
            "use_context_key": {
                "type": "boolean",
                "description": "Resolve the key from the execution context instead"
            },
            "context_key": {
                "type": "string",
                "description": "Context field holding the key when use_context_key is set"
            }
        }
    })
});

/// Reads one key from the key-value store.
///
/// With `use_context_key`, the literal key is resolved from
/// `context.data[context_key]` at execution time.
pub struct KvGetTask {
    kv: Arc<dyn KvStore>,
}

impl KvGetTask {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }
}

/// Resolve a field either literally or through the context indirection
pub(super) fn resolve_indirect(
    input: &Value,
    context: &WorkflowContext,
    field: &'static str,
    use_flag: &str,
    context_field: &'static str,
) -> Result<Value, TaskError> {
    if flag(input, use_flag) {
        let context_key = optional_str(input, context_field)
            .ok_or(TaskError::MissingField(context_field))?;
        context
            .get(context_key)
            .cloned()
            .ok_or_else(|| TaskError::invalid_field(
                context_field,
                format!("context has no entry '{}'", context_key),
            ))
    } else {
        input
            .get(field)
            .cloned()
            .filter(|v| !v.is_null())
            .ok_or(TaskError::MissingField(field))
    }
}

pub(super) fn resolve_indirect_str(
    input: &Value,
    context: &WorkflowContext,
    field: &'static str,
    use_flag: &str,
    context_field: &'static str,
) -> Result<String, TaskError> {
    match resolve_indirect(input, context, field, use_flag, context_field)? {
        Value::String(s) => Ok(s),
        other => Err(TaskError::invalid_field(field, format!("expected a string, got {}", other))),
    }
}

#[async_trait]
impl WorkflowTask for KvGetTask {
    fn task_type(&self) -> &str {
        "kv-get"
    }

    fn schema(&self) -> &Value {
        &KV_GET_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("KV Get", "storage", "Read a value from the key-value store")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if flag(input, "use_context_key") {
            report.require_string(input, "context_key");
        } else {
            report.require_string(input, "key");
        }
        report
    }

    async fn execute(
        &self,
        input: Value,
        context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let key =
            resolve_indirect_str(&input, context, "key", "use_context_key", "context_key")?;

        let entry = self.kv.get(&key).await?;

        let mut output = base_output();
        output.insert("key".to_string(), Value::String(key));
        match entry {
            Some(entry) => {
                output.insert("exists".to_string(), Value::Bool(true));
                output.insert("value".to_string(), entry.value);
            }
            None => {
                output.insert("exists".to_string(), Value::Bool(false));
                output.insert("value".to_string(), Value::Null);
            }
        }
        Ok(Value::Object(output))
    }
}
