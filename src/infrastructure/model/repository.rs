//! Cached model descriptor repository over the object store

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::model::{split_storage_key, storage_key, ModelDescriptor, NetworkType};
use crate::domain::storage::ObjectStore;

const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Result of [`ModelRepository::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Written,
    /// An object already existed and overwrite was not requested; nothing was written
    AlreadyExists,
}

/// Descriptors keyed by `{network_type}/{name}`.
///
/// The cache is filled lazily on the first list and replaced wholesale on
/// refresh. Writes from other processes become visible after a refresh.
#[derive(Debug)]
pub struct ModelRepository {
    store: Arc<dyn ObjectStore>,
    cache: RwLock<Option<HashMap<String, ModelDescriptor>>>,
    fetch_concurrency: usize,
}

impl ModelRepository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Read one descriptor straight from the store.
    ///
    /// `Ok(None)` means absent (or a zero-byte object); an unreadable or
    /// invalid object is an error.
    pub async fn fetch(
        &self,
        name: &str,
        network_type: NetworkType,
    ) -> Result<Option<ModelDescriptor>, DomainError> {
        let key = storage_key(name, network_type);

        match self.store.stat(&key).await? {
            Some(stat) if stat.size > 0 => {}
            _ => return Ok(None),
        }

        let body = match self.store.get(&key).await {
            Ok(body) => body,
            Err(DomainError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        decode_object(&key, network_type, name, &body).map(Some)
    }

    /// Look up a descriptor, reporting every failure as `NotFound`
    pub async fn get(
        &self,
        name: &str,
        network_type: NetworkType,
    ) -> Result<ModelDescriptor, DomainError> {
        match self.fetch(name, network_type).await {
            Ok(Some(descriptor)) => Ok(descriptor),
            Ok(None) => {
                debug!(%network_type, name, "Model not present in store");
                Err(not_found(name, network_type))
            }
            Err(e) => {
                warn!(%network_type, name, error = %e, "Failed to read model");
                Err(not_found(name, network_type))
            }
        }
    }

    /// Rebuild the cache from every object in the bucket.
    ///
    /// Keys that are not `{network_type}/{name}` and objects that fail to load
    /// are skipped. A failed listing leaves the previous cache untouched.
    pub async fn refresh(&self) -> Result<usize, DomainError> {
        let keys = self.store.list("").await?;
        let total_keys = keys.len();

        let candidates: Vec<(String, NetworkType, String)> = keys
            .into_iter()
            .filter_map(|key| {
                let (type_segment, name) = match split_storage_key(&key) {
                    Some(parts) => parts,
                    None => {
                        debug!(key = %key, "Skipping object with unexpected key shape");
                        return None;
                    }
                };

                match type_segment.parse::<NetworkType>() {
                    Ok(network_type) => {
                        let name = name.to_string();
                        Some((key, network_type, name))
                    }
                    Err(_) => {
                        debug!(key = %key, "Skipping object with unknown network type");
                        None
                    }
                }
            })
            .collect();

        let store = &self.store;
        let loaded: Vec<Option<(String, ModelDescriptor)>> = stream::iter(candidates)
            .map(|(key, network_type, name)| async move {
                let body = match store.get(&key).await {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(key = %key, error = %e, "Skipping unreadable object");
                        return None;
                    }
                };

                match decode_object(&key, network_type, &name, &body) {
                    Ok(descriptor) => Some((key, descriptor)),
                    Err(e) => {
                        debug!(key = %key, error = %e, "Skipping invalid model descriptor");
                        None
                    }
                }
            })
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

        let models: HashMap<String, ModelDescriptor> = loaded.into_iter().flatten().collect();
        let count = models.len();

        *self.cache.write().await = Some(models);

        info!(
            models = count,
            skipped = total_keys - count,
            "Model cache refreshed"
        );

        Ok(count)
    }

    /// Store a descriptor.
    ///
    /// Without `overwrite` an existing object is left as is and
    /// [`AddOutcome::AlreadyExists`] is returned.
    pub async fn add(
        &self,
        descriptor: ModelDescriptor,
        overwrite: bool,
    ) -> Result<AddOutcome, DomainError> {
        let key = descriptor.storage_key();

        if !overwrite {
            if let Some(stat) = self.store.stat(&key).await? {
                if stat.size > 0 {
                    warn!(key = %key, "Model already exists and overwrite is disabled");
                    return Ok(AddOutcome::AlreadyExists);
                }
            }
        }

        let body = Bytes::from(descriptor.to_bytes()?);
        self.store
            .put(&key, body, object_metadata(&descriptor))
            .await?;

        if let Some(models) = self.cache.write().await.as_mut() {
            models.insert(key.clone(), descriptor);
        }

        info!(key = %key, overwrite, "Model stored");
        Ok(AddOutcome::Written)
    }

    /// Validate loose JSON and store it
    pub async fn add_raw(&self, value: Value, overwrite: bool) -> Result<AddOutcome, DomainError> {
        let descriptor = ModelDescriptor::from_value(value)?;
        self.add(descriptor, overwrite).await
    }

    /// Apply a partial update to an existing descriptor and overwrite it
    pub async fn update(
        &self,
        name: &str,
        network_type: NetworkType,
        patch: Map<String, Value>,
    ) -> Result<ModelDescriptor, DomainError> {
        let current = self
            .fetch(name, network_type)
            .await?
            .ok_or_else(|| not_found(name, network_type))?;

        let updated = current.patched(patch)?;

        if updated.storage_key() != current.storage_key() {
            return Err(DomainError::schema(
                "name and network_type cannot be changed by an update",
            ));
        }

        self.add(updated.clone(), true).await?;
        Ok(updated)
    }

    /// Remove a descriptor from the store and the cache
    pub async fn delete(&self, name: &str, network_type: NetworkType) -> Result<(), DomainError> {
        let key = storage_key(name, network_type);

        self.store.delete(&key).await?;

        if let Some(models) = self.cache.write().await.as_mut() {
            models.remove(&key);
        }

        info!(key = %key, "Model deleted");
        Ok(())
    }

    /// All cached descriptors sorted by `(network_type, name)`, loading on first use
    pub async fn list(&self) -> Result<Vec<ModelDescriptor>, DomainError> {
        if let Some(models) = self.cache.read().await.as_ref() {
            return Ok(sorted(models));
        }

        self.refresh().await?;

        Ok(self
            .cache
            .read()
            .await
            .as_ref()
            .map(sorted)
            .unwrap_or_default())
    }

    /// Model names in list order
    pub async fn names(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.list().await?.into_iter().map(|m| m.name).collect())
    }

}

fn sorted(models: &HashMap<String, ModelDescriptor>) -> Vec<ModelDescriptor> {
    let mut list: Vec<ModelDescriptor> = models.values().cloned().collect();
    list.sort_by(|a, b| (a.network_type, &a.name).cmp(&(b.network_type, &b.name)));
    list
}

fn not_found(name: &str, network_type: NetworkType) -> DomainError {
    DomainError::not_found(format!("Model '{}/{}' not found", network_type, name))
}

/// Decode an object body. The key is the identity, so it overrides the
/// `name` and `network_type` written in the body.
fn decode_object(
    key: &str,
    network_type: NetworkType,
    name: &str,
    body: &[u8],
) -> Result<ModelDescriptor, DomainError> {
    let mut descriptor = ModelDescriptor::from_slice(body)?;

    if descriptor.network_type != network_type || descriptor.name != name {
        debug!(
            key = %key,
            body_key = %descriptor.storage_key(),
            "Descriptor body disagrees with its key; using the key"
        );
        descriptor.network_type = network_type;
        descriptor.name = name.to_string();
    }

    Ok(descriptor)
}

fn object_metadata(descriptor: &ModelDescriptor) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("name".to_string(), descriptor.name.clone());
    metadata.insert(
        "network_type".to_string(),
        descriptor.network_type.to_string(),
    );
    metadata.insert("enabled".to_string(), descriptor.enabled.to_string());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{InMemoryObjectStore, StoreOperation};
    use serde_json::json;

    fn descriptor(name: &str, network_type: &str) -> ModelDescriptor {
        ModelDescriptor::from_value(json!({
            "name": name,
            "network_type": network_type,
            "description": format!("{} model", name)
        }))
        .unwrap()
    }

    fn setup() -> (Arc<InMemoryObjectStore>, ModelRepository) {
        let store = Arc::new(InMemoryObjectStore::new());
        let repository = ModelRepository::new(store.clone());
        (store, repository)
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let (_, repository) = setup();
        let model = descriptor("liver", "nnUNet");

        let outcome = repository.add(model.clone(), false).await.unwrap();
        assert_eq!(outcome, AddOutcome::Written);

        let fetched = repository.get("liver", NetworkType::NnUnet).await.unwrap();
        assert_eq!(fetched, model);
    }

    #[tokio::test]
    async fn test_add_writes_metadata() {
        let (store, repository) = setup();
        repository
            .add(descriptor("liver", "nnUNet_v2"), false)
            .await
            .unwrap();

        let stat = store.stat("nnUNet_v2/liver").await.unwrap().unwrap();
        assert_eq!(stat.metadata.get("name").map(String::as_str), Some("liver"));
        assert_eq!(
            stat.metadata.get("network_type").map(String::as_str),
            Some("nnUNet_v2")
        );
        assert_eq!(stat.metadata.get("enabled").map(String::as_str), Some("false"));
    }

    #[tokio::test]
    async fn test_add_without_overwrite_keeps_original() {
        let (_, repository) = setup();
        let original = descriptor("liver", "nnUNet");
        repository.add(original.clone(), false).await.unwrap();

        let mut changed = original.clone();
        changed.description = "changed".to_string();

        let outcome = repository.add(changed.clone(), false).await.unwrap();
        assert_eq!(outcome, AddOutcome::AlreadyExists);
        assert_eq!(
            repository.get("liver", NetworkType::NnUnet).await.unwrap(),
            original
        );

        let outcome = repository.add(changed.clone(), true).await.unwrap();
        assert_eq!(outcome, AddOutcome::Written);
        assert_eq!(
            repository.get("liver", NetworkType::NnUnet).await.unwrap(),
            changed
        );
    }

    #[tokio::test]
    async fn test_add_raw_validates() {
        let (store, repository) = setup();

        let err = repository
            .add_raw(json!({"name": "x", "network_type": "resnet"}), false)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SchemaValidation { .. }));
        assert!(store.is_empty().await);

        let outcome = repository
            .add_raw(json!({"name": "x", "network_type": "MIST"}), false)
            .await
            .unwrap();
        assert_eq!(outcome, AddOutcome::Written);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_, repository) = setup();

        let err = repository.get("nope", NetworkType::NnUnet).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_zero_byte_object_is_absent() {
        let (store, repository) = setup();
        store
            .put("nnUNet/empty", Bytes::new(), HashMap::new())
            .await
            .unwrap();

        assert!(repository.fetch("empty", NetworkType::NnUnet).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_object_fetch_errors_but_get_is_not_found() {
        let (store, repository) = setup();
        store
            .put("nnUNet/bad", Bytes::from_static(b"not json"), HashMap::new())
            .await
            .unwrap();

        let err = repository.fetch("bad", NetworkType::NnUnet).await.unwrap_err();
        assert!(matches!(err, DomainError::SchemaValidation { .. }));

        let err = repository.get("bad", NetworkType::NnUnet).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_same_name_different_network_types_coexist() {
        let (_, repository) = setup();
        repository.add(descriptor("liver", "nnUNet"), false).await.unwrap();
        repository.add(descriptor("liver", "MIST"), false).await.unwrap();

        let models = repository.list().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].network_type, NetworkType::Mist);
        assert_eq!(models[1].network_type, NetworkType::NnUnet);
    }

    #[tokio::test]
    async fn test_list_sorted_regardless_of_insertion_order() {
        let (_, repository) = setup();
        for (name, network_type) in [
            ("spleen", "nnUNet"),
            ("brain", "tensorflow"),
            ("aorta", "nnUNet"),
            ("kidney", "MIST"),
        ] {
            repository
                .add(descriptor(name, network_type), false)
                .await
                .unwrap();
        }

        let listed: Vec<(String, String)> = repository
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.network_type.to_string(), m.name))
            .collect();

        assert_eq!(
            listed,
            vec![
                ("MIST".to_string(), "kidney".to_string()),
                ("nnUNet".to_string(), "aorta".to_string()),
                ("nnUNet".to_string(), "spleen".to_string()),
                ("tensorflow".to_string(), "brain".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_refresh_skips_malformed_objects() {
        let (store, repository) = setup();
        let good = descriptor("liver", "nnUNet");
        store
            .put("nnUNet/liver", Bytes::from(good.to_bytes().unwrap()), HashMap::new())
            .await
            .unwrap();

        let entries: Vec<(&str, Bytes)> = vec![
            ("nnUNet/broken", Bytes::from_static(b"{not json")),
            ("resnet/model", Bytes::from_static(b"{}")),
            ("README", Bytes::from_static(b"hello")),
            ("nnUNet/a/b", Bytes::from_static(b"{}")),
        ];
        for (key, body) in entries {
            store.put(key, body, HashMap::new()).await.unwrap();
        }

        let count = repository.refresh().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(repository.list().await.unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn test_key_wins_over_body_identity() {
        let (store, repository) = setup();
        let body = descriptor("other", "tensorflow");
        store
            .put("nnUNet/renamed", Bytes::from(body.to_bytes().unwrap()), HashMap::new())
            .await
            .unwrap();

        assert_eq!(repository.refresh().await.unwrap(), 1);
        let listed = repository.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "renamed");
        assert_eq!(listed[0].network_type, NetworkType::NnUnet);
        assert_eq!(listed[0].description, "other model");

        let fetched = repository.get("renamed", NetworkType::NnUnet).await.unwrap();
        assert_eq!(fetched.name, "renamed");
    }

    #[tokio::test]
    async fn test_refresh_sees_external_writes() {
        let (store, repository) = setup();
        assert!(repository.list().await.unwrap().is_empty());

        let external = descriptor("external", "vista3d");
        store
            .put(
                "vista3d/external",
                Bytes::from(external.to_bytes().unwrap()),
                HashMap::new(),
            )
            .await
            .unwrap();

        assert!(repository.list().await.unwrap().is_empty());

        repository.refresh().await.unwrap();
        assert_eq!(repository.names().await.unwrap(), vec!["external".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_previous_cache() {
        let (store, repository) = setup();
        repository.add(descriptor("liver", "nnUNet"), false).await.unwrap();
        repository.refresh().await.unwrap();

        store.fail_on(StoreOperation::List).await;

        let err = repository.refresh().await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_from_store_and_cache() {
        let (store, repository) = setup();
        repository.add(descriptor("liver", "nnUNet"), false).await.unwrap();
        repository.refresh().await.unwrap();

        repository.delete("liver", NetworkType::NnUnet).await.unwrap();

        assert!(store.is_empty().await);
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_object_missing_from_cache() {
        let (store, repository) = setup();
        repository.refresh().await.unwrap();

        let model = descriptor("late", "nnUNet");
        store
            .put("nnUNet/late", Bytes::from(model.to_bytes().unwrap()), HashMap::new())
            .await
            .unwrap();

        repository.delete("late", NetworkType::NnUnet).await.unwrap();
        assert!(store.stat("nnUNet/late").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_store_failure_is_reported() {
        let (store, repository) = setup();
        repository.add(descriptor("liver", "nnUNet"), false).await.unwrap();
        repository.refresh().await.unwrap();
        store.fail_on(StoreOperation::Delete).await;

        let err = repository
            .delete("liver", NetworkType::NnUnet)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_patches_descriptor() {
        let (_, repository) = setup();
        repository.add(descriptor("liver", "nnUNet"), false).await.unwrap();

        let mut patch = Map::new();
        patch.insert("enabled".to_string(), json!(true));
        let updated = repository
            .update("liver", NetworkType::NnUnet, patch)
            .await
            .unwrap();
        assert!(updated.enabled);

        let stored = repository.get("liver", NetworkType::NnUnet).await.unwrap();
        assert!(stored.enabled);

        let mut rename = Map::new();
        rename.insert("name".to_string(), json!("kidney"));
        let err = repository
            .update("liver", NetworkType::NnUnet, rename)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn test_concurrency_setting_is_clamped() {
        let store = Arc::new(InMemoryObjectStore::new());
        let repository = ModelRepository::new(store).with_fetch_concurrency(0);
        assert!(repository.refresh().await.is_ok());
    }
}
