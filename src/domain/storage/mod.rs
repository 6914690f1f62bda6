//! Object storage abstraction for the model bucket

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::DomainError;

/// Result of a stat call on an existing object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectStat {
    pub size: u64,
    pub metadata: HashMap<String, String>,
}

/// Flat key/value object store (S3, MinIO, or in-memory)
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Lists every key that starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>, DomainError>;

    /// Returns `None` when the key does not exist
    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>, DomainError>;

    async fn get(&self, key: &str) -> Result<Bytes, DomainError>;

    /// Creates or replaces the object (last writer wins)
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: HashMap<String, String>,
    ) -> Result<(), DomainError>;

    /// Removes the object; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// Short backend identifier for logs and health output
    fn backend_name(&self) -> &'static str;
}
