// SPDX-License-Identifier: MIT

//! Event bus contract and the in-memory implementation
//!
//! The memory bus keeps a bounded history of recent events and fans out to
//! live subscribers over a broadcast channel, which the SSE relay endpoint
//! streams to dashboard clients.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::StoreError;

const HISTORY_LIMIT: usize = 256;

/// An event accepted by the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub event_id: Uuid,
    pub detail_type: String,
    pub source: String,
    pub detail: Value,
    pub timestamp: DateTime<Utc>,
}

/// Contract for the event-bus collaborator
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event, returning it with its assigned id.
    async fn send(
        &self,
        detail_type: &str,
        detail: Value,
        source: &str,
    ) -> Result<PublishedEvent, StoreError>;

    /// Subscribe to events published after this call.
    fn subscribe(&self) -> broadcast::Receiver<PublishedEvent>;

    /// Most recent events, oldest first.
    async fn recent(&self) -> Vec<PublishedEvent>;
}

/// In-memory event bus with bounded history
pub struct MemoryEventBus {
    history: RwLock<VecDeque<PublishedEvent>>,
    sender: broadcast::Sender<PublishedEvent>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HISTORY_LIMIT);
        Self {
            history: RwLock::new(VecDeque::new()),
            sender,
        }
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn send(
        &self,
        detail_type: &str,
        detail: Value,
        source: &str,
    ) -> Result<PublishedEvent, StoreError> {
        if detail_type.is_empty() {
            return Err(StoreError::Backend("empty detail_type".to_string()));
        }

        let event = PublishedEvent {
            event_id: Uuid::new_v4(),
            detail_type: detail_type.to_string(),
            source: source.to_string(),
            detail,
            timestamp: Utc::now(),
        };

        let mut history = self.history.write().await;
        if history.len() >= HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(event.clone());
        drop(history);

        // No subscribers is fine; send only fails when nobody listens
        let _ = self.sender.send(event.clone());

        Ok(event)
    }

    fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    async fn recent(&self) -> Vec<PublishedEvent> {
        let history = self.history.read().await;
        history.iter().cloned().collect()
    }
}
