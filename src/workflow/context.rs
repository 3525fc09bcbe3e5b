// SPDX-License-Identifier: MIT

//! Per-execution shared context
//!
//! One `WorkflowContext` lives for the duration of a single execution and is
//! discarded afterwards. The engine writes each node's output under the
//! namespaced key `output.<node_id>`; tasks may additionally read and write
//! keys by convention (the KV tasks' context indirection).

use serde_json::{Map, Value};

/// Mutable state shared across all task invocations in one execution
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    /// Id of the node currently executing
    pub node_id: String,
    /// Shared data bag; last write wins on a given key
    pub data: Map<String, Value>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Key under which the engine records a node's full output
    pub fn output_key(node_id: &str) -> String {
        format!("output.{}", node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = WorkflowContext::new();
        ctx.insert("report-key", json!("daily"));
        assert_eq!(ctx.get("report-key"), Some(&json!("daily")));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut ctx = WorkflowContext::new();
        ctx.insert("k", json!(1));
        ctx.insert("k", json!(2));
        assert_eq!(ctx.get("k"), Some(&json!(2)));
    }

    #[test]
    fn test_output_key_namespacing() {
        assert_eq!(WorkflowContext::output_key("kv-set-1"), "output.kv-set-1");
    }
}
