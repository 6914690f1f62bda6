//! Storage backends: object stores for model descriptors and the PostgreSQL pool

pub mod in_memory;
pub mod migrations;
pub mod postgres;
pub mod s3;

use std::sync::Arc;

use tracing::info;

use crate::config::{ObjectStoreBackend, ObjectStoreConfig};
use crate::domain::DomainError;
use crate::domain::storage::ObjectStore;

pub use in_memory::{InMemoryObjectStore, StoreOperation};
pub use postgres::connect_pool;
pub use s3::S3ObjectStore;

/// Builds the configured object store backend
pub async fn create_object_store(
    config: &ObjectStoreConfig,
) -> Result<Arc<dyn ObjectStore>, DomainError> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        ObjectStoreBackend::S3 => Arc::new(S3ObjectStore::new(config).await?),
        ObjectStoreBackend::Memory => Arc::new(InMemoryObjectStore::new()),
    };

    info!(
        backend = store.backend_name(),
        bucket = %config.bucket,
        "Object store initialized"
    );

    Ok(store)
}
