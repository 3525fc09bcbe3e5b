// SPDX-License-Identifier: MIT

//! Connection-graph validation and execution ordering
//!
//! Rules enforced before any node runs:
//! 1. Node ids must be unique within the definition.
//! 2. Every connection must reference existing nodes on both sides.
//! 3. The directed graph must be acyclic.
//!
//! Returns the topological execution order on success. Order among
//! independent siblings follows node declaration order, which keeps runs
//! deterministic.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::WorkflowError;

use super::types::WorkflowDefinition;

/// Validate the definition's graph and return node ids in execution order
pub fn execution_order(definition: &WorkflowDefinition) -> Result<Vec<String>, WorkflowError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &definition.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(WorkflowError::DuplicateNodeId(node.id.clone()));
        }
    }

    for connection in &definition.connections {
        if !seen.contains(connection.from.as_str()) {
            return Err(WorkflowError::UnknownNodeReference {
                node_id: connection.from.clone(),
                side: "from",
            });
        }
        if !seen.contains(connection.to.as_str()) {
            return Err(WorkflowError::UnknownNodeReference {
                node_id: connection.to.clone(),
                side: "to",
            });
        }
    }

    // Kahn's algorithm, seeded in declaration order
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in &definition.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    for connection in &definition.connections {
        adjacency
            .entry(connection.from.as_str())
            .or_default()
            .push(connection.to.as_str());
        *in_degree.entry(connection.to.as_str()).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = definition
        .nodes
        .iter()
        .filter(|node| in_degree[node.id.as_str()] == 0)
        .map(|node| node.id.as_str())
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(definition.nodes.len());

    while let Some(node_id) = queue.pop_front() {
        order.push(node_id.to_owned());

        if let Some(downstream) = adjacency.get(node_id) {
            for &next in downstream {
                let degree = in_degree.entry(next).or_insert(0);
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if order.len() != definition.nodes.len() {
        return Err(WorkflowError::CycleDetected);
    }

    Ok(order)
}
