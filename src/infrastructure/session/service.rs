//! Login sessions backed by opaque bearer tokens

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domain::auth::Identity;
use crate::domain::session::{Session, SessionRepository};
use crate::domain::DomainError;
use crate::infrastructure::token::{hash_token, TokenGenerator};

#[derive(Debug)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    generator: TokenGenerator,
    ttl: Duration,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionRepository>, ttl: Duration) -> Self {
        Self {
            sessions,
            generator: TokenGenerator::new("mds_"),
            ttl,
        }
    }

    /// Open a session for an authenticated identity, returning the raw session token
    pub async fn start(&self, identity: &Identity) -> Result<(String, Session), DomainError> {
        let generated = self.generator.generate();
        let session = self
            .sessions
            .create(Session::new(identity, generated.hash, self.ttl))
            .await?;

        info!(
            username = %session.username,
            auth_source = %session.auth_source,
            expires_at = %session.expires_at,
            "Session started"
        );

        Ok((generated.token, session))
    }

    pub async fn resolve(&self, raw: &str) -> Result<Identity, DomainError> {
        self.resolve_at(raw, Utc::now()).await
    }

    pub async fn resolve_at(&self, raw: &str, now: DateTime<Utc>) -> Result<Identity, DomainError> {
        let token_hash = hash_token(raw);

        let session = self
            .sessions
            .find_by_hash(&token_hash)
            .await?
            .ok_or_else(|| DomainError::not_found("Invalid session"))?;

        if session.is_expired_at(now) {
            debug!(username = %session.username, "Discarding expired session");
            self.sessions.delete_by_hash(&token_hash).await?;
            return Err(DomainError::TokenExpired);
        }

        Ok(session.identity())
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn end(&self, raw: &str) -> Result<(), DomainError> {
        if self.sessions.delete_by_hash(&hash_token(raw)).await? {
            info!("Session ended");
        }
        Ok(())
    }

    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let removed = self.sessions.delete_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::AuthSource;
    use crate::infrastructure::session::InMemorySessionRepository;

    fn identity() -> Identity {
        Identity {
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            auth_source: AuthSource::Local,
            groups: vec!["local-users".to_string()],
        }
    }

    fn service() -> (SessionService, Arc<InMemorySessionRepository>) {
        let repo = Arc::new(InMemorySessionRepository::new());
        (SessionService::new(repo.clone(), Duration::hours(12)), repo)
    }

    #[tokio::test]
    async fn test_start_and_resolve() {
        let (service, _) = service();

        let (token, session) = service.start(&identity()).await.unwrap();
        assert!(token.starts_with("mds_"));
        assert_eq!(session.expires_at - session.created_at, Duration::hours(12));

        let resolved = service.resolve(&token).await.unwrap();
        assert_eq!(resolved, identity());
    }

    #[tokio::test]
    async fn test_resolve_unknown() {
        let (service, _) = service();

        let err = service.resolve("mds_unknown").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let (service, repo) = service();
        let (token, session) = service.start(&identity()).await.unwrap();

        let err = service
            .resolve_at(&token, session.expires_at + Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::TokenExpired));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let (service, _) = service();
        let (token, _) = service.start(&identity()).await.unwrap();

        service.end(&token).await.unwrap();
        service.end(&token).await.unwrap();

        assert!(service.resolve(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let short = SessionService::new(repo.clone(), Duration::seconds(-1));
        let long = SessionService::new(repo.clone(), Duration::hours(1));

        short.start(&identity()).await.unwrap();
        long.start(&identity()).await.unwrap();

        assert_eq!(long.purge_expired().await.unwrap(), 1);
        assert_eq!(repo.len().await, 1);
    }
}
