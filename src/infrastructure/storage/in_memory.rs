//! In-memory object store
//!
//! Useful for testing and development. Data is lost when the process terminates.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::storage::{ObjectStat, ObjectStore};

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    List,
    Stat,
    Get,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    metadata: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failing: RwLock<HashSet<StoreOperation>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `operation` fail with a storage error
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.failing.write().await.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    async fn check(&self, operation: StoreOperation) -> Result<(), DomainError> {
        if self.failing.read().await.contains(&operation) {
            return Err(DomainError::storage(format!(
                "Simulated {:?} failure",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, DomainError> {
        self.check(StoreOperation::List).await?;
        let objects = self.objects.read().await;

        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>, DomainError> {
        self.check(StoreOperation::Stat).await?;
        let objects = self.objects.read().await;

        Ok(objects.get(key).map(|object| ObjectStat {
            size: object.body.len() as u64,
            metadata: object.metadata.clone(),
        }))
    }

    async fn get(&self, key: &str) -> Result<Bytes, DomainError> {
        self.check(StoreOperation::Get).await?;
        let objects = self.objects.read().await;

        objects
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| DomainError::not_found(format!("Object '{}' not found", key)))
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: HashMap<String, String>,
    ) -> Result<(), DomainError> {
        self.check(StoreOperation::Put).await?;
        let mut objects = self.objects.write().await;

        objects.insert(key.to_string(), StoredObject { body, metadata });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.check(StoreOperation::Delete).await?;
        let mut objects = self.objects.write().await;

        objects.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_stat_get_delete() {
        let store = InMemoryObjectStore::new();
        let mut metadata = HashMap::new();
        metadata.insert("name".to_string(), "liver".to_string());

        store
            .put("nnUNet/liver", Bytes::from_static(b"{}"), metadata.clone())
            .await
            .unwrap();

        let stat = store.stat("nnUNet/liver").await.unwrap().unwrap();
        assert_eq!(stat.size, 2);
        assert_eq!(stat.metadata, metadata);
        assert_eq!(store.get("nnUNet/liver").await.unwrap(), Bytes::from_static(b"{}"));

        store.delete("nnUNet/liver").await.unwrap();
        assert!(store.stat("nnUNet/liver").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let store = InMemoryObjectStore::new();
        for key in ["MIST/a", "nnUNet/b", "nnUNet/c"] {
            store.put(key, Bytes::new(), HashMap::new()).await.unwrap();
        }

        assert_eq!(store.list("").await.unwrap().len(), 3);
        assert_eq!(
            store.list("nnUNet/").await.unwrap(),
            vec!["nnUNet/b".to_string(), "nnUNet/c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let store = InMemoryObjectStore::new();
        assert!(store.delete("nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryObjectStore::new();
        store.fail_on(StoreOperation::Delete).await;

        let err = store.delete("x").await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));

        store.clear_failures().await;
        assert!(store.delete("x").await.is_ok());
    }
}
