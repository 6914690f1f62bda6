//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::user::{User, UserRepository};

/// In-memory implementation of UserRepository, ordered by username
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error
    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }

    async fn check_should_fail(&self) -> Result<(), DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::storage("Simulated user storage failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.check_should_fail().await?;
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.check_should_fail().await?;
        let mut users = self.users.write().await;

        if users.contains_key(user.username()) {
            return Err(DomainError::duplicate_username(user.username()));
        }

        users.insert(user.username().to_string(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        self.check_should_fail().await?;
        let mut users = self.users.write().await;

        match users.get_mut(user.username()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user.clone())
            }
            None => Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.username()
            ))),
        }
    }

    async fn delete(&self, username: &str) -> Result<bool, DomainError> {
        self.check_should_fail().await?;
        let mut users = self.users.write().await;
        Ok(users.remove(username).is_some())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        self.check_should_fail().await?;
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}
