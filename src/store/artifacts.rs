// SPDX-License-Identifier: MIT

//! Artifact (object) store contract with in-memory and filesystem backends
//!
//! Keys may contain `/` separators; the filesystem backend maps them onto a
//! directory tree under its root and records the content type in a sidecar
//! `<key>.meta` JSON file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::StoreError;

const META_SUFFIX: &str = ".meta";

/// Listing entry for an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// A retrieved artifact with its content
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Result of storing an artifact
#[derive(Debug, Clone, Serialize)]
pub struct StoredArtifact {
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// Contract for the object-store collaborator backing artifact tasks
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredArtifact, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError>;

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<ArtifactMeta>, StoreError>;

    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// In-memory artifact store
pub struct MemoryArtifactStore {
    objects: RwLock<HashMap<String, Artifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredArtifact, StoreError> {
        validate_key(key)?;

        let size = content.len() as u64;
        let artifact = Artifact {
            key: key.to_string(),
            content,
            content_type: content_type.to_string(),
            size,
            last_modified: Utc::now(),
        };

        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), artifact);

        Ok(StoredArtifact {
            key: key.to_string(),
            url: format!("memory://artifacts/{}", key),
            size,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).cloned())
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<ArtifactMeta>, StoreError> {
        let prefix = prefix.unwrap_or("");
        let objects = self.objects.read().await;
        let mut items: Vec<ArtifactMeta> = objects
            .values()
            .filter(|artifact| artifact.key.starts_with(prefix))
            .map(|artifact| ArtifactMeta {
                key: artifact.key.clone(),
                size: artifact.size,
                last_modified: artifact.last_modified,
            })
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut objects = self.objects.write().await;
        Ok(objects.remove(key).is_some())
    }
}

/// Sidecar metadata persisted next to each stored file
#[derive(Serialize, Deserialize)]
struct SidecarMeta {
    content_type: String,
}

/// Filesystem-backed artifact store
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}{}", key, META_SUFFIX))
    }

    async fn read_content_type(&self, key: &str) -> String {
        match fs::read(self.meta_path_for(key)).await {
            Ok(bytes) => serde_json::from_slice::<SidecarMeta>(&bytes)
                .map(|meta| meta.content_type)
                .unwrap_or_else(|_| "application/octet-stream".to_string()),
            Err(_) => "application/octet-stream".to_string(),
        }
    }
}

fn modified_time(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredArtifact, StoreError> {
        validate_key(key)?;

        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = content.len() as u64;
        fs::write(&path, content).await?;

        let meta = SidecarMeta {
            content_type: content_type.to_string(),
        };
        fs::write(self.meta_path_for(key), serde_json::to_vec(&meta)?).await?;

        Ok(StoredArtifact {
            key: key.to_string(),
            url: format!("file://{}", path.display()),
            size,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError> {
        validate_key(key)?;

        let path = self.path_for(key);
        let content = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let metadata = fs::metadata(&path).await?;
        let content_type = self.read_content_type(key).await;

        Ok(Some(Artifact {
            key: key.to_string(),
            size: content.len() as u64,
            last_modified: modified_time(&metadata),
            content,
            content_type,
        }))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<ArtifactMeta>, StoreError> {
        let prefix = prefix.unwrap_or("");
        let mut items = Vec::new();

        if !self.root.exists() {
            return Ok(items);
        }

        // Iterative directory walk; sidecar files are skipped
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    stack.push(path);
                    continue;
                }

                let key = relative_key(&self.root, &path);
                if key.ends_with(META_SUFFIX) || !key.starts_with(prefix) {
                    continue;
                }

                let metadata = entry.metadata().await?;
                items.push(ArtifactMeta {
                    key,
                    size: metadata.len(),
                    last_modified: modified_time(&metadata),
                });
            }
        }

        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;

        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                let _ = fs::remove_file(self.meta_path_for(key)).await;
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_get_round_trip() {
        let store = MemoryArtifactStore::new();
        let stored = store
            .put("reports/daily.json", b"{\"total\":1}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(stored.size, 11);
        assert_eq!(stored.url, "memory://artifacts/reports/daily.json");

        let artifact = store.get("reports/daily.json").await.unwrap().unwrap();
        assert_eq!(artifact.content, b"{\"total\":1}");
        assert_eq!(artifact.content_type, "application/json");
    }

    #[tokio::test]
    async fn test_memory_get_missing() {
        let store = MemoryArtifactStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_list_with_prefix() {
        let store = MemoryArtifactStore::new();
        store.put("a/1.txt", b"x".to_vec(), "text/plain").await.unwrap();
        store.put("a/2.txt", b"y".to_vec(), "text/plain").await.unwrap();
        store.put("b/3.txt", b"z".to_vec(), "text/plain").await.unwrap();

        let items = store.list(Some("a/")).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, "a/1.txt");

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_key_traversal_is_rejected() {
        let store = MemoryArtifactStore::new();
        let err = store.put("../escape", b"x".to_vec(), "text/plain").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));

        let err = store.put("/abs", b"x".to_vec(), "text/plain").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_fs_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let stored = store
            .put("nested/out.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert!(stored.url.starts_with("file://"));

        let artifact = store.get("nested/out.txt").await.unwrap().unwrap();
        assert_eq!(artifact.content, b"hello");
        assert_eq!(artifact.content_type, "text/plain");
        assert_eq!(artifact.size, 5);
    }

    #[tokio::test]
    async fn test_fs_list_skips_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.put("a.txt", b"1".to_vec(), "text/plain").await.unwrap();
        store.put("sub/b.txt", b"2".to_vec(), "text/plain").await.unwrap();

        let items = store.list(None).await.unwrap();
        let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_fs_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.put("gone.txt", b"x".to_vec(), "text/plain").await.unwrap();

        assert!(store.delete("gone.txt").await.unwrap());
        assert!(!store.delete("gone.txt").await.unwrap());
        assert!(store.get("gone.txt").await.unwrap().is_none());
    }
}
