// SPDX-License-Identifier: MIT

//! Background workflow runs for the tool bridge
//!
//! `workflow_start` spawns an execution and returns immediately; the tracker
//! keeps each run's status and final result for later `workflow_status`
//! polls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::engine::WorkflowEngine;
use super::types::{WorkflowDefinition, WorkflowResult, WorkflowStatus};

/// Lifecycle of one tracked run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Point-in-time view of a tracked run
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub workflow_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkflowResult>,
}

/// Tracks background workflow executions by run id
#[derive(Clone)]
pub struct RunTracker {
    runs: Arc<RwLock<HashMap<Uuid, RunSnapshot>>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn an execution on a background task and return its run id
    pub async fn start(&self, engine: WorkflowEngine, definition: WorkflowDefinition) -> Uuid {
        let run_id = Uuid::new_v4();
        let snapshot = RunSnapshot {
            run_id,
            workflow_name: definition.name.clone(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            result: None,
        };

        {
            let mut runs = self.runs.write().await;
            runs.insert(run_id, snapshot);
        }

        let runs = self.runs.clone();
        tokio::spawn(async move {
            log::info!("Run {} started for workflow '{}'", run_id, definition.name);
            let result = engine.execute(&definition).await;

            let status = match result.status {
                WorkflowStatus::Completed => RunStatus::Completed,
                WorkflowStatus::Failed => RunStatus::Failed,
            };
            log::info!("Run {} finished: {:?}", run_id, status);

            let mut runs = runs.write().await;
            if let Some(snapshot) = runs.get_mut(&run_id) {
                snapshot.status = status;
                snapshot.result = Some(result);
            }
        });

        run_id
    }

    pub async fn status(&self, run_id: &Uuid) -> Option<RunSnapshot> {
        let runs = self.runs.read().await;
        runs.get(run_id).cloned()
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
