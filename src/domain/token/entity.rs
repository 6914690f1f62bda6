//! API token entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Description stored when the caller supplies none
pub const DEFAULT_TOKEN_DESCRIPTION: &str = "No description";

/// Persisted bearer token. Only the SHA-256 digest of the raw value is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    id: Uuid,
    username: String,
    #[serde(skip_serializing)]
    token_hash: String,
    description: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    /// Create a token record valid for `ttl` from now
    pub fn new(
        username: impl Into<String>,
        token_hash: impl Into<String>,
        description: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let description = description.into();
        let description = if description.trim().is_empty() {
            DEFAULT_TOKEN_DESCRIPTION.to_string()
        } else {
            description
        };

        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            token_hash: token_hash.into(),
            description,
            expires_at: now + ttl,
            created_at: now,
            last_used_at: None,
        }
    }

    /// Rebuild a token from persisted columns
    pub fn restore(
        id: Uuid,
        username: String,
        token_hash: String,
        description: String,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            username,
            token_hash,
            description,
            expires_at,
            created_at,
            last_used_at,
        }
    }

    // Getters

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    /// A token is expired once `now` is strictly past `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    /// Metadata safe to show the owner
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            id: self.id,
            description: self.description.clone(),
            expires_at: self.expires_at,
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        }
    }
}

/// Token metadata without the secret or its hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: Uuid,
    pub description: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_description_defaults() {
        let token = ApiToken::new("alice", "hash", "  ", Duration::days(30));
        assert_eq!(token.description(), DEFAULT_TOKEN_DESCRIPTION);

        let token = ApiToken::new("alice", "hash", "ci pipeline", Duration::days(30));
        assert_eq!(token.description(), "ci pipeline");
    }

    #[test]
    fn test_expiry_is_strictly_after() {
        let token = ApiToken::new("alice", "hash", "", Duration::days(1));
        let expires_at = token.expires_at();

        assert!(!token.is_expired_at(expires_at));
        assert!(token.is_expired_at(expires_at + Duration::seconds(1)));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_info_omits_hash() {
        let token = ApiToken::new("alice", "secret-hash", "laptop", Duration::days(1));
        let json = serde_json::to_string(&token.info()).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(json.contains("laptop"));
    }
}
