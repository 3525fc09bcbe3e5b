// SPDX-License-Identifier: MIT

//! Built-in workflow task implementations
//!
//! Each task wraps exactly one external side effect behind the
//! `WorkflowTask` contract. `register_all_tasks` installs the whole set at
//! startup.

mod artifacts_get;
mod artifacts_list;
mod artifacts_put;
mod cache;
mod http_request;
mod kv_get;
mod kv_set;
mod trigger;

pub use artifacts_get::ArtifactsGetTask;
pub use artifacts_list::ArtifactsListTask;
pub use artifacts_put::ArtifactsPutTask;
pub use cache::CacheTask;
pub use http_request::HttpRequestTask;
pub use kv_get::KvGetTask;
pub use kv_set::KvSetTask;
pub use trigger::TriggerTask;

use std::sync::Arc;

use crate::store::Services;

use super::registry::TaskRegistry;

/// Register every built-in task against the given service clients
pub async fn register_all_tasks(registry: &TaskRegistry, services: &Services) {
    registry.register(Arc::new(TriggerTask::new())).await;
    registry.register(Arc::new(KvGetTask::new(services.kv.clone()))).await;
    registry.register(Arc::new(KvSetTask::new(services.kv.clone()))).await;
    registry
        .register(Arc::new(ArtifactsPutTask::new(services.artifacts.clone())))
        .await;
    registry
        .register(Arc::new(ArtifactsGetTask::new(services.artifacts.clone())))
        .await;
    registry
        .register(Arc::new(ArtifactsListTask::new(services.artifacts.clone())))
        .await;
    registry.register(Arc::new(CacheTask::new(services.kv.clone()))).await;
    registry.register(Arc::new(HttpRequestTask::new())).await;

    log::info!(
        "Registered {} task types",
        registry.task_types().await.len()
    );
}
