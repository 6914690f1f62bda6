//! In-memory session repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::session::{Session, SessionRepository};

/// In-memory implementation of SessionRepository keyed by token hash
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.username != username);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}
