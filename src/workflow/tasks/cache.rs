// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::TaskError;
use crate::store::KvStore;
use crate::workflow::context::WorkflowContext;
use crate::workflow::task::{
    base_output, required_str, ttl_hours, DisplayInfo, ValidationReport, WorkflowTask,
};

/// All cache entries live in one flat namespace in the KV store
const CACHE_PREFIX: &str = "workflow-cache:";

static CACHE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "op": {
                "type": "string",
                "enum": ["get", "set", "delete", "clear"],
                "description": "The cache operation to perform"
            },
            "key": {
                "type": "string",
                "description": "Cache key (required for get/set/delete)"
            },
            "value": {
                "description": "Value to cache (required for set)"
            },
            "ttl_hours": {
                "type": "number",
                "description": "Optional TTL for set"
            }
        },
        "required": ["op"]
    })
});

/// Cache operations over the `workflow-cache:` namespace in the KV store.
///
/// `clear` scans the namespace and deletes every entry, reporting the true
/// count removed.
pub struct CacheTask {
    kv: Arc<dyn KvStore>,
}

impl CacheTask {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn cache_key(key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }
}

#[async_trait]
impl WorkflowTask for CacheTask {
    fn task_type(&self) -> &str {
        "cache"
    }

    fn schema(&self) -> &Value {
        &CACHE_SCHEMA
    }

    fn display_info(&self) -> DisplayInfo {
        DisplayInfo::new("Cache", "storage", "Get, set, delete, or clear cached values")
    }

    fn validate(&self, input: &Value) -> ValidationReport {
        let mut report = ValidationReport::ok();
        let op = match input.get("op").and_then(|v| v.as_str()) {
            Some(op) => op,
            None => {
                report.error("Missing required field 'op'");
                return report;
            }
        };

        match op {
            "get" | "delete" => {
                report.require_string(input, "key");
            }
            "set" => {
                report.require_string(input, "key");
                if input.get("value").map(Value::is_null).unwrap_or(true) {
                    report.error("Missing required field 'value'");
                }
            }
            "clear" => {}
            other => {
                report.error(format!("Unknown cache op '{}'", other));
            }
        }
        report
    }

    async fn execute(
        &self,
        input: Value,
        _context: &mut WorkflowContext,
    ) -> Result<Value, TaskError> {
        let op = required_str(&input, "op")?;

        let mut output = base_output();
        output.insert("op".to_string(), Value::String(op.to_string()));

        match op {
            "get" => {
                let key = required_str(&input, "key")?;
                output.insert("key".to_string(), Value::String(key.to_string()));
                match self.kv.get(&Self::cache_key(key)).await? {
                    Some(entry) => {
                        output.insert("found".to_string(), Value::Bool(true));
                        output.insert("value".to_string(), entry.value);
                    }
                    None => {
                        output.insert("found".to_string(), Value::Bool(false));
                    }
                }
            }
            "set" => {
                let key = required_str(&input, "key")?;
                let value = input
                    .get("value")
                    .cloned()
                    .filter(|v| !v.is_null())
                    .ok_or(TaskError::MissingField("value"))?;
                self.kv
                    .set(&Self::cache_key(key), value, ttl_hours(&input))
                    .await?;
                output.insert("key".to_string(), Value::String(key.to_string()));
            }
            "delete" => {
                let key = required_str(&input, "key")?;
                let deleted = self.kv.delete(&Self::cache_key(key)).await?;
                output.insert("key".to_string(), Value::String(key.to_string()));
                output.insert("deleted".to_string(), Value::Bool(deleted));
            }
            "clear" => {
                let keys = self.kv.scan(CACHE_PREFIX).await?;
                let mut cleared = 0u64;
                for key in &keys {
                    if self.kv.delete(key).await? {
                        cleared += 1;
                    }
                }
                output.insert("cleared".to_string(), json!(cleared));
            }
            other => {
                return Err(TaskError::invalid_field(
                    "op",
                    format!("unknown cache op '{}'", other),
                ))
            }
        }

        Ok(Value::Object(output))
    }
}
