use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{message}")]
    InvalidCredentials { message: String },

    #[error("{message}")]
    AccountDisabled { message: String },

    #[error("{message}")]
    NotAuthorized { message: String },

    #[error("Username '{username}' already exists")]
    DuplicateUsername { username: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API token has expired")]
    TokenExpired,

    #[error("Schema validation error: {message}")]
    SchemaValidation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    pub fn account_disabled(message: impl Into<String>) -> Self {
        Self::AccountDisabled {
            message: message.into(),
        }
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors caused by the caller's credentials rather than by the system
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::AccountDisabled { .. } | Self::TokenExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Model 'nnUNet/liver' not found");
        assert_eq!(error.to_string(), "Not found: Model 'nnUNet/liver' not found");
    }

    #[test]
    fn test_credential_messages_are_passed_through() {
        let error = DomainError::invalid_credentials("Invalid username or password");
        assert_eq!(error.to_string(), "Invalid username or password");
        assert!(error.is_authentication_failure());
    }

    #[test]
    fn test_duplicate_username_error() {
        let error = DomainError::duplicate_username("alice");
        assert_eq!(error.to_string(), "Username 'alice' already exists");
        assert!(!error.is_authentication_failure());
    }

    #[test]
    fn test_token_expired_error() {
        assert_eq!(DomainError::TokenExpired.to_string(), "API token has expired");
        assert!(DomainError::TokenExpired.is_authentication_failure());
    }
}
