// SPDX-License-Identifier: MIT

//! Workflow executor
//!
//! Walks a validated definition in topological order, one node at a time.
//! Independent branches are never run concurrently; the producer→consumer
//! ordering implied by connections is the only ordering guarantee callers
//! should rely on.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Instant;

use crate::error::{TaskExecutionError, WorkflowError};

use super::context::WorkflowContext;
use super::graph;
use super::registry::TaskRegistry;
use super::types::{WorkflowDefinition, WorkflowResult, WorkflowStatus};

/// Executes workflow definitions against a task registry
#[derive(Clone)]
pub struct WorkflowEngine {
    registry: TaskRegistry,
}

impl WorkflowEngine {
    pub fn new(registry: TaskRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Execute a definition end-to-end, producing one result.
    ///
    /// Graph-shape errors (duplicate ids, dangling connections, cycles) fail
    /// the run before any node executes. A node failure stops scheduling and
    /// returns the partial results accumulated so far; external side effects
    /// of completed nodes are not rolled back.
    pub async fn execute(&self, definition: &WorkflowDefinition) -> WorkflowResult {
        let started = Instant::now();

        let order = match graph::execution_order(definition) {
            Ok(order) => order,
            Err(err) => {
                log::error!("Workflow '{}' rejected: {}", definition.name, err);
                return failed(HashMap::new(), 0, started, err);
            }
        };

        log::info!(
            "Executing workflow '{}' ({} nodes)",
            definition.name,
            order.len()
        );

        let mut context = WorkflowContext::new();
        let mut results: HashMap<String, Value> = HashMap::new();
        // Structured per-node output store; inputs are routed from here via
        // the connection graph rather than through the shared data bag.
        let mut outputs: HashMap<String, Value> = HashMap::new();

        for node_id in &order {
            // Ids come from the validated order, so the node exists
            let node = definition.node(node_id).expect("validated node id");

            let task = match self.registry.resolve(&node.node_type).await {
                Ok(task) => task,
                Err(err) => {
                    log::error!("Node '{}' aborted workflow: {}", node_id, err);
                    return failed(results, outputs.len(), started, err);
                }
            };

            let input = build_input(definition, node_id, &node.config, &outputs);
            context.node_id = node_id.clone();

            log::info!("Executing node '{}' (task '{}')", node_id, node.node_type);

            match task.execute(input, &mut context).await {
                Ok(output) => {
                    context.insert(WorkflowContext::output_key(node_id), output.clone());
                    results.insert(node_id.clone(), output.clone());
                    outputs.insert(node_id.clone(), output);
                }
                Err(err) => {
                    let err = TaskExecutionError::new(node.node_type.clone(), node_id.clone(), err);
                    log::error!("{}", err);
                    return failed(results, outputs.len(), started, err.into());
                }
            }
        }

        WorkflowResult {
            status: WorkflowStatus::Completed,
            nodes_executed: results.len(),
            results,
            execution_time_ms: started.elapsed().as_millis() as u64,
            error: None,
        }
    }
}

fn failed(
    results: HashMap<String, Value>,
    nodes_executed: usize,
    started: Instant,
    error: WorkflowError,
) -> WorkflowResult {
    WorkflowResult {
        status: WorkflowStatus::Failed,
        results,
        nodes_executed,
        execution_time_ms: started.elapsed().as_millis() as u64,
        error: Some(error.to_string()),
    }
}

/// Merge a node's static config with upstream outputs routed through its
/// inbound connections (`from_output` field → `to_input` key).
fn build_input(
    definition: &WorkflowDefinition,
    node_id: &str,
    config: &Value,
    outputs: &HashMap<String, Value>,
) -> Value {
    let mut input: Map<String, Value> = match config {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            log::warn!(
                "Node '{}' config is not an object ({}), ignoring it",
                node_id,
                other
            );
            Map::new()
        }
    };

    for connection in definition.inbound(node_id) {
        let Some(upstream) = outputs.get(&connection.from) else {
            // Upstream failed or produced nothing; leave the input untouched
            continue;
        };

        match extract_path(upstream, &connection.from_output) {
            Some(value) => {
                input.insert(connection.to_input.clone(), value);
            }
            None => {
                log::warn!(
                    "Node '{}' output has no field '{}' for connection to '{}'",
                    connection.from,
                    connection.from_output,
                    node_id
                );
            }
        }
    }

    Value::Object(input)
}

/// Extract a value from JSON using a simple dot-notation path
fn extract_path(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current.clone())
}
