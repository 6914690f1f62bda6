//! API token service: issuing, validating and revoking bearer tokens

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::auth::{AuthSource, Identity};
use crate::domain::token::{ApiToken, ApiTokenRepository, TokenInfo};
use crate::domain::user::{User, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::user::PasswordHasher;

use super::generator::{hash_token, TokenGenerator};

/// A newly issued token. `token` is the only time the raw value is visible.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(flatten)]
    pub info: TokenInfo,
}

#[derive(Debug)]
pub struct TokenService {
    tokens: Arc<dyn ApiTokenRepository>,
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    generator: TokenGenerator,
    ttl: Duration,
}

impl TokenService {
    pub fn new(
        tokens: Arc<dyn ApiTokenRepository>,
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        generator: TokenGenerator,
        ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            users,
            hasher,
            generator,
            ttl,
        }
    }

    /// Issue a token for an existing, active local user
    pub async fn issue_token(
        &self,
        username: &str,
        description: &str,
    ) -> Result<IssuedToken, DomainError> {
        let user = self
            .users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", username)))?;

        if !user.is_active() {
            return Err(DomainError::account_disabled("User account is disabled"));
        }

        self.persist_new_token(user.username(), description).await
    }

    /// Issue a token for an authenticated identity.
    ///
    /// Directory users have no local row until their first token, so one is
    /// provisioned with an unusable random password.
    pub async fn issue_token_for(
        &self,
        identity: &Identity,
        description: &str,
    ) -> Result<IssuedToken, DomainError> {
        if identity.auth_source == AuthSource::Directory {
            self.provision_directory_user(identity).await?;
        }

        self.issue_token(&identity.username, description).await
    }

    async fn provision_directory_user(&self, identity: &Identity) -> Result<(), DomainError> {
        if self.users.exists(&identity.username).await? {
            return Ok(());
        }

        // Nobody ever learns this value, so password login stays impossible
        let unusable = self.generator.generate().token;
        let user = User::new(&identity.username, self.hasher.hash(&unusable)?)
            .with_display_name(&identity.display_name)
            .with_email(&identity.email);

        match self.users.create(user).await {
            Ok(_) => {
                info!(username = %identity.username, "Provisioned local user for directory identity");
                Ok(())
            }
            // Lost a race with a concurrent provisioning of the same user
            Err(DomainError::DuplicateUsername { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn persist_new_token(
        &self,
        username: &str,
        description: &str,
    ) -> Result<IssuedToken, DomainError> {
        let generated = self.generator.generate();
        let token = ApiToken::new(username, generated.hash, description, self.ttl);
        let token = self.tokens.create(token).await?;

        info!(
            username = %username,
            token_id = %token.id(),
            expires_at = %token.expires_at(),
            "Issued API token"
        );

        Ok(IssuedToken {
            token: generated.token,
            info: token.info(),
        })
    }

    pub async fn validate_token(&self, raw: &str) -> Result<Identity, DomainError> {
        self.validate_token_at(raw, Utc::now()).await
    }

    /// Validate a raw token against the clock value `now`
    pub async fn validate_token_at(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, DomainError> {
        let token_hash = hash_token(raw);

        let token = self
            .tokens
            .find_by_hash(&token_hash)
            .await?
            .ok_or_else(|| DomainError::not_found("Invalid API token"))?;

        if token.is_expired_at(now) {
            debug!(token_id = %token.id(), "Rejected expired API token");
            return Err(DomainError::TokenExpired);
        }

        let user = match self.users.get(token.username()).await? {
            Some(user) if user.is_active() => user,
            _ => return Err(DomainError::account_disabled("User not found or inactive")),
        };

        if let Err(e) = self.tokens.record_usage(&token_hash, now).await {
            warn!(token_id = %token.id(), error = %e, "Failed to record API token usage");
        }

        Ok(Identity::from_user(&user, AuthSource::ApiToken))
    }

    /// Revoke by raw token value
    pub async fn revoke_token(&self, raw: &str) -> Result<(), DomainError> {
        if !self.tokens.delete_by_hash(&hash_token(raw)).await? {
            return Err(DomainError::not_found("Token not found"));
        }

        info!("Revoked API token");
        Ok(())
    }

    /// Revoke one of `username`'s tokens by its id
    pub async fn revoke_owned_token(&self, username: &str, id: Uuid) -> Result<(), DomainError> {
        if !self.tokens.delete_owned(username, id).await? {
            return Err(DomainError::not_found("Token not found"));
        }

        info!(username = %username, token_id = %id, "Revoked API token");
        Ok(())
    }

    /// Token metadata for `username`, newest first
    pub async fn list_tokens(&self, username: &str) -> Result<Vec<TokenInfo>, DomainError> {
        let tokens = self.tokens.list_for_user(username).await?;
        Ok(tokens.iter().map(ApiToken::info).collect())
    }
}
