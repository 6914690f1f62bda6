//! API token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use uuid::Uuid;

use super::entity::ApiToken;
use crate::domain::DomainError;

/// Repository trait for API token storage
#[async_trait]
pub trait ApiTokenRepository: Send + Sync + Debug {
    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>, DomainError>;

    /// Returns true if a token was removed
    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Removes the token with `id` only if `username` owns it
    async fn delete_owned(&self, username: &str, id: Uuid) -> Result<bool, DomainError>;

    /// Tokens owned by `username`, newest first
    async fn list_for_user(&self, username: &str) -> Result<Vec<ApiToken>, DomainError>;

    async fn record_usage(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Removes every token owned by `username`, returning how many were deleted
    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError>;
}
