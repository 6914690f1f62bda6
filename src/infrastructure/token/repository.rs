//! In-memory API token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::token::{ApiToken, ApiTokenRepository};

/// In-memory implementation of ApiTokenRepository keyed by token hash
#[derive(Debug, Default)]
pub struct InMemoryApiTokenRepository {
    tokens: Arc<RwLock<HashMap<String, ApiToken>>>,
    fail_usage_updates: Arc<RwLock<bool>>,
}

impl InMemoryApiTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record_usage` fail, leaving every other call working
    pub async fn set_fail_usage_updates(&self, fail: bool) {
        *self.fail_usage_updates.write().await = fail;
    }
}

#[async_trait]
impl ApiTokenRepository for InMemoryApiTokenRepository {
    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(token.token_hash()) {
            return Err(DomainError::internal("Token hash collision"));
        }

        tokens.insert(token.token_hash().to_string(), token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.remove(token_hash).is_some())
    }

    async fn delete_owned(&self, username: &str, id: Uuid) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        let hash = tokens
            .values()
            .find(|t| t.id() == id && t.username() == username)
            .map(|t| t.token_hash().to_string());

        Ok(match hash {
            Some(hash) => tokens.remove(&hash).is_some(),
            None => false,
        })
    }

    async fn list_for_user(&self, username: &str) -> Result<Vec<ApiToken>, DomainError> {
        let tokens = self.tokens.read().await;

        let mut owned: Vec<ApiToken> = tokens
            .values()
            .filter(|t| t.username() == username)
            .cloned()
            .collect();
        owned.sort_by_key(|t| std::cmp::Reverse(t.created_at()));

        Ok(owned)
    }

    async fn record_usage(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        if *self.fail_usage_updates.read().await {
            return Err(DomainError::storage("Simulated usage update failure"));
        }

        let mut tokens = self.tokens.write().await;
        if let Some(token) = tokens.get_mut(token_hash) {
            token.record_usage(at);
        }
        Ok(())
    }

    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.username() != username);
        Ok((before - tokens.len()) as u64)
    }
}
