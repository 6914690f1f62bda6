//! User service for local account management

use std::sync::Arc;

use tracing::info;

use crate::domain::session::SessionRepository;
use crate::domain::token::ApiTokenRepository;
use crate::domain::user::{validate_password, validate_username, User, UserRepository};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Request for creating a new local user
#[derive(Debug, Clone, Default)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Administrative operations on the local credential store
#[derive(Debug)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn ApiTokenRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn ApiTokenRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            tokens,
            sessions,
            hasher,
        }
    }

    /// Create a local user with an Argon2id password hash
    pub async fn create_local_user(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        validate_username(&request.username).map_err(|e| DomainError::schema(e.to_string()))?;
        validate_password(&request.password).map_err(|e| DomainError::schema(e.to_string()))?;

        if self.users.exists(&request.username).await? {
            return Err(DomainError::duplicate_username(&request.username));
        }

        let mut user = User::new(&request.username, self.hasher.hash(&request.password)?);
        if let Some(display_name) = request.display_name {
            user = user.with_display_name(display_name);
        }
        if let Some(email) = request.email {
            user = user.with_email(email);
        }

        let user = self.users.create(user).await?;
        info!(username = %user.username(), "Created local user");
        Ok(user)
    }

    pub async fn get(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.users.get(username).await
    }

    /// All users ordered by username
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.users.list().await
    }

    /// Enable or disable an account. Disabling also ends its sessions.
    pub async fn set_active(&self, username: &str, active: bool) -> Result<User, DomainError> {
        let mut user = self.require(username).await?;
        user.set_active(active);
        let user = self.users.update(&user).await?;

        if !active {
            self.sessions.delete_for_user(username).await?;
        }

        info!(username = %username, active, "Updated user status");
        Ok(user)
    }

    pub async fn reset_password(&self, username: &str, password: &str) -> Result<User, DomainError> {
        validate_password(password).map_err(|e| DomainError::schema(e.to_string()))?;

        let mut user = self.require(username).await?;
        user.set_password_hash(self.hasher.hash(password)?);
        let user = self.users.update(&user).await?;

        info!(username = %username, "Reset user password");
        Ok(user)
    }

    /// Delete a user along with its tokens and sessions, returning the number of tokens removed
    pub async fn delete_user(&self, username: &str) -> Result<u64, DomainError> {
        self.require(username).await?;

        let tokens_removed = self.tokens.delete_for_user(username).await?;
        self.sessions.delete_for_user(username).await?;
        self.users.delete(username).await?;

        info!(username = %username, tokens_removed, "Deleted user");
        Ok(tokens_removed)
    }

    async fn require(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .get(username)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", username)))
    }
}
