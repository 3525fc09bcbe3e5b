// SPDX-License-Identifier: MIT

//! Key-value store contract and the in-memory backend
//!
//! Entries carry an optional absolute expiry derived from a TTL in hours.
//! Expired entries read as absent everywhere (`get`, `delete`, `scan`).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// A stored key-value entry
#[derive(Debug, Clone, Serialize)]
pub struct KvEntry {
    pub value: Value,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl KvEntry {
    /// Whether this entry's TTL has elapsed
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() >= expiry,
            None => false,
        }
    }
}

/// Contract for the key-value collaborator backing KV and cache tasks
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a key. Expired entries return `None`.
    async fn get(&self, key: &str) -> Result<Option<KvEntry>, StoreError>;

    /// Write a key with an optional TTL in hours.
    async fn set(&self, key: &str, value: Value, ttl_hours: Option<u32>) -> Result<(), StoreError>;

    /// Remove a key. Returns `true` iff a live entry existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// List live keys starting with `prefix`.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory key-value store with lazy expiry
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, KvEntry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<KvEntry>, StoreError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl_hours: Option<u32>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key".to_string()));
        }

        let now = Utc::now();
        let entry = KvEntry {
            value,
            created_at: now,
            expires_at: ttl_hours.map(|hours| now + Duration::hours(i64::from(hours))),
        };

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
