// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::WorkflowError;

use super::task::WorkflowTask;

/// String-keyed dispatch table from task type to implementation.
///
/// Populated once at startup; registration is idempotent per type with
/// last registration winning.
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Arc<dyn WorkflowTask>>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, task: Arc<dyn WorkflowTask>) {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.task_type().to_string(), task);
    }

    pub async fn has_task(&self, task_type: &str) -> bool {
        let tasks = self.tasks.read().await;
        tasks.contains_key(task_type)
    }

    /// All registered task types, sorted for stable UI listings
    pub async fn task_types(&self) -> Vec<String> {
        let tasks = self.tasks.read().await;
        let mut types: Vec<String> = tasks.keys().cloned().collect();
        types.sort();
        types
    }

    pub async fn resolve(&self, task_type: &str) -> Result<Arc<dyn WorkflowTask>, WorkflowError> {
        let tasks = self.tasks.read().await;
        tasks
            .get(task_type)
            .cloned()
            .ok_or_else(|| WorkflowError::TaskNotFound(task_type.to_string()))
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
