// SPDX-License-Identifier: MIT

//! Thin service-store contracts and their local backends
//!
//! This module defines the three external collaborators the workflow tasks
//! and MCP tools talk to: a key-value store, an artifact (object) store, and
//! an event bus. Backends are swappable behind the traits.

pub mod artifacts;
pub mod events;
pub mod kv;

pub use artifacts::{Artifact, ArtifactMeta, ArtifactStore, FsArtifactStore, MemoryArtifactStore, StoredArtifact};
pub use events::{EventBus, MemoryEventBus, PublishedEvent};
pub use kv::{KvEntry, KvStore, MemoryKvStore};

use std::sync::Arc;

/// The service clients injected into tasks and tool handlers
#[derive(Clone)]
pub struct Services {
    pub kv: Arc<dyn KvStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub events: Arc<dyn EventBus>,
}

impl Services {
    /// All-in-memory services, used by tests and the default local runtime
    pub fn in_memory() -> Self {
        Self {
            kv: Arc::new(MemoryKvStore::new()),
            artifacts: Arc::new(MemoryArtifactStore::new()),
            events: Arc::new(MemoryEventBus::new()),
        }
    }
}
