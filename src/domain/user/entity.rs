//! Local user entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locally stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique login name
    username: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    display_name: String,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            display_name: String::new(),
            email: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from persisted columns
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        username: String,
        password_hash: String,
        display_name: String,
        email: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            password_hash,
            display_name,
            email,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    // Getters

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Name to show people, falling back to the username when unset
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.updated_at = Utc::now();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = User::new("alice", "hash");

        assert_eq!(user.username(), "alice");
        assert!(user.is_active());
        assert_eq!(user.created_at(), user.updated_at());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = User::new("alice", "hash");
        assert_eq!(user.display_name(), "");
        assert_eq!(user.label(), "alice");

        let named = User::new("bob", "hash").with_display_name("Bob Smith");
        assert_eq!(named.label(), "Bob Smith");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("alice", "secret-hash");
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(json.contains("alice"));
    }

    #[test]
    fn test_set_active_bumps_updated_at() {
        let mut user = User::new("alice", "hash");
        let before = user.updated_at();

        user.set_active(false);

        assert!(!user.is_active());
        assert!(user.updated_at() >= before);
    }
}
