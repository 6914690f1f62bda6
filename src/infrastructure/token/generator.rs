//! Bearer token generation
//!
//! Generates cryptographically secure tokens and the digests stored in their place.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A freshly generated token
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    /// The raw token (only shown once at creation)
    pub token: String,
    /// Hex SHA-256 digest for storage and lookup
    pub hash: String,
}

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Generator for secure bearer tokens
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    prefix: String,
}

impl TokenGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generate a new token from the OS-seeded thread RNG
    pub fn generate(&self) -> GeneratedToken {
        let mut random_bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let token = format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(&random_bytes));
        let hash = hash_token(&token);

        GeneratedToken { token, hash }
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new("mdt_")
    }
}

/// Lowercase hex SHA-256 of the raw token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
