//! In-memory blob store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::BlobStore;
use crate::error::{EtlError, Result};

/// Blob store backed by a sorted map.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Whether an object exists.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| EtlError::Storage(format!("No such key: {}", key)))
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<()> {
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        let body = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| EtlError::Storage(format!("No such key: {}", source_key)))?;
        objects.insert(dest_key.to_string(), body);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| EtlError::Storage(format!("No such key: {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_prefix_scoped() {
        tokio_test::block_on(async {
            let store = MemoryBlobStore::new();
            store.put("raw/a.json", Bytes::from_static(b"{}")).await.unwrap();
            store.put("raw/b.txt", Bytes::from_static(b"")).await.unwrap();
            store.put("rawer/c.json", Bytes::from_static(b"{}")).await.unwrap();
            store.put("out/d.csv", Bytes::from_static(b"")).await.unwrap();

            let keys = store.list("raw/").await.unwrap();
            assert_eq!(keys, ["raw/a.json", "raw/b.txt"]);
        });
    }

    #[test]
    fn test_copy_then_delete_moves() {
        tokio_test::block_on(async {
            let store = MemoryBlobStore::new();
            store.put("raw/a.json", Bytes::from_static(b"{}")).await.unwrap();
            store.copy("raw/a.json", "done/a.json").await.unwrap();
            assert!(store.contains("raw/a.json").await);
            store.delete("raw/a.json").await.unwrap();

            assert!(!store.contains("raw/a.json").await);
            assert_eq!(store.get("done/a.json").await.unwrap(), Bytes::from_static(b"{}"));
        });
    }

    #[test]
    fn test_missing_keys_are_errors() {
        tokio_test::block_on(async {
            let store = MemoryBlobStore::new();
            assert!(matches!(store.get("nope").await, Err(EtlError::Storage(_))));
            assert!(store.copy("nope", "x").await.is_err());
            assert!(store.delete("nope").await.is_err());
            assert!(store.is_empty().await);
        });
    }
}
