//! Directory service seam

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Attributes read from the user's directory entry after a successful bind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectoryEntry {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectoryError {
    /// The bind was refused
    #[error("Directory rejected the credentials")]
    InvalidCredentials,

    /// The bind succeeded but the search found no entry
    #[error("Directory entry not found for '{0}'")]
    EntryNotFound(String),

    /// Connection, TLS, or protocol failure
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Binds as a user and reads their entry
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn lookup(&self, username: &str, password: &str)
    -> Result<DirectoryEntry, DirectoryError>;
}
