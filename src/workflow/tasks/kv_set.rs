// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::KvStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, flag, ttl_hours, DisplayInfo, ValidationReport, WorkflowTask,
};

use super::kv_get::{resolve_indirect, resolve_indirect_str};

static KV_SET_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "key": {
                "type": "string",
                "description": "The key to write"
            },
            "value": {
                "description": "The value to store"
            },
            "ttl_hours": {
                "type": "number",
                "description": "Optional time to live in hours"
            },
            "use_context_key": {
                "type": "boolean",
                "description": "Resolve the key from the execution context instead"
            },
            "context_key": {
                "type": "string",
                "description": "Context field holding the key when use_context_key is set"
            },
            "use_context_value": {
                "type": "boolean",
                "description": "Resolve the value from the execution context instead"
            },
            "context_value": {
                "type": "string",
                "description": "Context field holding the value when use_context_value is set"
            }
        }
    })
});

/// Writes one key to the key-value store, with optional TTL.
///
/// Both the key and the value support context indirection via
/// `use_context_key` / `use_context_value`.
pub struct KvSetTask {
    kv: Arc<dyn KvStore>,
}

impl KvSetTask {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl WorkflowTask for KvSetTask {
    fn task_type(&self) -> &str {
        "kv-set"
    }

    fn schema(&self) -> &Value {
        &KV_SET_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("KV Set", "storage", "Write a value to the key-value store")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        if flag(input, "use_context_key") {
            report.require_string(input, "context_key");
        } else {
            report.require_string(input, "key");
        }
        if flag(input, "use_context_value") {
            report.require_string(input, "context_value");
        } else if input.get("value").map(Value::is_null).unwrap_or(true) {
            report.error("Missing required field 'value'");
        }
        if let Some(ttl) = input.get("ttl_hours") {
            if !ttl.is_u64() {
                report.error("Field 'ttl_hours' must be a non-negative integer");
            }
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
        let value =
            resolve_indirect(&input, context, "value", "use_context_value", "context_value")?;

        self.kv.set(&key, value, ttl_hours(&input)).await?;

        let mut output = base_output();
        output.insert("key".to_string(), Value::String(key));
        Ok(Value::Object(output))
    }
}
