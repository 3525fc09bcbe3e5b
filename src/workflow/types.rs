// SPDX-License-Identifier: MIT

//! Workflow definition types
//!
//! These structures round-trip the builder UI's JSON shape (camelCase for
//! connection endpoints) and are immutable once execution starts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Top-level workflow definition: nodes plus directed connections
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    #[serde(default = "default_version")]
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub connections: Vec<WorkflowConnection>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl WorkflowDefinition {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Connections targeting the given node (fan-in)
    pub fn inbound<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowConnection> + 'a {
        self.connections.iter().filter(move |c| c.to == node_id)
    }
}

/// A placed task instance within the workflow graph
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowNode {
    /// Unique within the definition; join key for connections and results
    pub id: String,
    /// Task type key resolved through the registry
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas position, layout only
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Declared input port names (UI metadata)
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Declared output port names (UI metadata)
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Static task configuration merged into the execution input
    #[serde(default)]
    pub config: Value,
}

/// A directed edge routing one node's named output into another's input
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConnection {
    pub from: String,
    pub to: String,
    #[serde(rename = "fromOutput")]
    pub from_output: String,
    #[serde(rename = "toInput")]
    pub to_input: String,
}

/// Terminal state of one workflow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// The durable outcome of one execution
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowResult {
    pub status: WorkflowStatus,
    /// Per-node task outputs, keyed by node id; nodes that never ran are absent
    pub results: HashMap<String, Value>,
    pub nodes_executed: usize,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
