//! Login session domain

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::auth::{AuthSource, Identity};

/// Server-side record of a logged-in identity, keyed by the digest of its token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub username: String,
    pub auth_source: AuthSource,
    pub display_name: String,
    pub email: String,
    pub groups: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: &Identity, token_hash: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            token_hash: token_hash.into(),
            username: identity.username.clone(),
            auth_source: identity.auth_source,
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            groups: identity.groups.clone(),
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            auth_source: self.auth_source,
            groups: self.groups.clone(),
        }
    }
}

/// Repository trait for session storage
#[async_trait]
pub trait SessionRepository: Send + Sync + Debug {
    async fn create(&self, session: Session) -> Result<Session, DomainError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError>;

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError>;

    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError>;

    /// Removes sessions whose expiry is before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_carries_identity() {
        let identity = Identity {
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            auth_source: AuthSource::Directory,
            groups: vec!["cn=users".to_string()],
        };

        let session = Session::new(&identity, "hash", Duration::hours(12));

        assert_eq!(session.identity(), identity);
        assert!(!session.is_expired_at(session.created_at));
        assert!(session.is_expired_at(session.expires_at + Duration::seconds(1)));
    }
}
