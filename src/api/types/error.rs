//! JSON error responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ConflictError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Body of every error response: `{"error": {"message", "type"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    /// 401. The response carries a `WWW-Authenticate: Bearer` challenge.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// Map a failure raised while checking a bearer credential.
    ///
    /// An unknown token surfaces as `NotFound` from the services but is a 401 here.
    pub fn from_auth_failure(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { message } => Self::unauthorized(message),
            e if e.is_authentication_failure() => Self::unauthorized(e.to_string()),
            e => Self::from(e),
        }
    }

    pub fn message(&self) -> &str {
        &self.response.error.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (self.status, Json(self.response)).into_response();

        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::InvalidCredentials { message }
            | DomainError::AccountDisabled { message } => Self::unauthorized(message),
            DomainError::TokenExpired => Self::unauthorized(err.to_string()),
            DomainError::NotAuthorized { message } => Self::forbidden(message),
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::SchemaValidation { .. } => Self::bad_request(err.to_string()),
            DomainError::DuplicateUsername { .. } => Self::conflict(err.to_string()),
            DomainError::Storage { .. }
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => {
                error!(error = %err, "Request failed");
                Self::internal(err.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Invalid descriptor");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.error_type, ApiErrorType::InvalidRequestError);
        assert_eq!(err.message(), "Invalid descriptor");
    }

    #[test]
    fn test_domain_error_conversion() {
        let cases = [
            (DomainError::invalid_credentials("bad"), StatusCode::UNAUTHORIZED),
            (DomainError::account_disabled("off"), StatusCode::UNAUTHORIZED),
            (DomainError::TokenExpired, StatusCode::UNAUTHORIZED),
            (DomainError::not_authorized("no"), StatusCode::FORBIDDEN),
            (DomainError::not_found("gone"), StatusCode::NOT_FOUND),
            (DomainError::schema("bad field"), StatusCode::BAD_REQUEST),
            (DomainError::duplicate_username("alice"), StatusCode::CONFLICT),
            (DomainError::storage("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::configuration("bad"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("bug"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_auth_failure_maps_not_found_to_unauthorized() {
        let err = ApiError::from_auth_failure(DomainError::not_found("Invalid API token"));
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid API token");

        let storage = ApiError::from_auth_failure(DomainError::storage("db down"));
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError::unauthorized("Invalid API token").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let not_found = ApiError::not_found("gone").into_response();
        assert!(not_found.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("Invalid API token");
        let json = serde_json::to_string(&err.response).unwrap();

        assert!(json.contains("\"type\":\"authentication_error\""));
        assert!(json.contains("Invalid API token"));
        assert!(!json.contains("code"));
    }
}
