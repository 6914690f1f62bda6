//! User validation utilities

use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Username contains invalid character: '{0}'. Only letters, digits, '.', '_', '-' and '@' are allowed")]
    InvalidUsernameCharacter(char),

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),
}

const MAX_USERNAME_LENGTH: usize = 64;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a username
///
/// Rules:
/// - Cannot be empty
/// - Maximum 64 characters
/// - ASCII letters, digits, `.`, `_`, `-` and `@` only (directory uids and emails)
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    if username.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    for c in username.chars() {
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@')) {
            return Err(UserValidationError::InvalidUsernameCharacter(c));
        }
    }

    Ok(())
}

/// Validate a password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("jane.doe").is_ok());
        assert!(validate_username("svc-dashboard_01").is_ok());
        assert!(validate_username("user@example.com").is_ok());
    }

    #[test]
    fn test_invalid_usernames() {
        assert_eq!(validate_username(""), Err(UserValidationError::EmptyUsername));
        assert_eq!(
            validate_username("has space"),
            Err(UserValidationError::InvalidUsernameCharacter(' '))
        );
        assert_eq!(
            validate_username("a*b"),
            Err(UserValidationError::InvalidUsernameCharacter('*'))
        );
        assert_eq!(
            validate_username(&"a".repeat(65)),
            Err(UserValidationError::UsernameTooLong(64))
        );
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345678").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"x".repeat(129)),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }
}
