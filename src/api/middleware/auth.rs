//! Bearer credential extractors

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::auth::Identity;

/// Extractor that requires a valid API token in `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct RequireToken(pub Identity);

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let identity = state
            .tokens
            .validate_token(&token)
            .await
            .map_err(ApiError::from_auth_failure)?;

        debug!(username = %identity.username, "API token accepted");
        Ok(RequireToken(identity))
    }
}

/// Extractor that requires a live login session in `Authorization: Bearer <session token>`
#[derive(Debug, Clone)]
pub struct RequireSession {
    pub identity: Identity,
    /// Raw session token, kept so the session can be ended
    pub token: String,
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        let identity = state
            .sessions
            .resolve(&token)
            .await
            .map_err(ApiError::from_auth_failure)?;

        Ok(RequireSession { identity, token })
    }
}

/// Pull the credential out of an `Authorization: Bearer` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header encoding"))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid authentication credentials"))?;

    Ok(token.to_string())
}
