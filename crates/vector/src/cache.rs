//! Embedding cache keyed by SHA-256 of (provider, model, text).
//!
//! Entries live in memory for the life of the cache; with a directory set,
//! each entry is also written to `<dir>/<key>.json` and read back on a miss.

use pptmaker_common::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Embedding cache
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, Vec<f32>>>,
    dir: Option<PathBuf>,
}

impl EmbeddingCache {
    /// Cache that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dir: None,
        }
    }

    /// Cache persisted as JSON files under `dir`
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{}.json", key)))
    }

    /// Look up an embedding, falling back to disk.
    ///
    /// Unreadable or corrupt files count as a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        if let Some(embedding) = self.entries.read().await.get(key) {
            return Some(embedding.clone());
        }

        let path = self.entry_path(key)?;
        let data = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str::<Vec<f32>>(&data) {
            Ok(embedding) => {
                debug!("Embedding cache file hit: {}", path.display());
                self.entries.write().await.insert(key.to_string(), embedding.clone());
                Some(embedding)
            }
            Err(e) => {
                warn!("Ignoring corrupt embedding cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store an embedding in memory and, when persistent, on disk
    pub async fn insert(&self, key: &str, embedding: Vec<f32>) -> Result<()> {
        if let Some(path) = self.entry_path(key) {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, serde_json::to_string(&embedding)?).await?;
        }

        self.entries.write().await.insert(key.to_string(), embedding);
        Ok(())
    }

    /// Number of entries held in memory
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptmaker_common::embedding_cache_key;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let cache = EmbeddingCache::in_memory();
        let key = embedding_cache_key("ollama@http://localhost:11434", "nomic-embed-text", "hello");

        assert!(cache.get(&key).await.is_none());
        cache.insert(&key, vec![1.0, 2.0]).await.unwrap();
        assert_eq!(cache.get(&key).await, Some(vec![1.0, 2.0]));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_persistent_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let key = embedding_cache_key("p", "m", "text");

        EmbeddingCache::persistent(dir.path().join("embeddings"))
            .insert(&key, vec![0.5, 0.25])
            .await
            .unwrap();

        let reopened = EmbeddingCache::persistent(dir.path().join("embeddings"));
        assert!(reopened.is_empty().await);
        assert_eq!(reopened.get(&key).await, Some(vec![0.5, 0.25]));
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::persistent(dir.path());
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        assert!(cache.get("bad").await.is_none());
    }
}
