//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::User;
use crate::domain::DomainError;

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user, failing with `DuplicateUsername` if the name is taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user and everything it owns, returns true if a row was removed
    async fn delete(&self, username: &str) -> Result<bool, DomainError>;

    /// List all users ordered by username
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    async fn exists(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.get(username).await?.is_some())
    }
}
