//! Login sessions and self-service API token management
//!
//! A successful login yields a session token. The session token is then used
//! as the bearer credential for `/auth/me` and the `/auth/tokens` endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::middleware::RequireSession;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::auth::{AuthMode, Identity};
use crate::domain::token::TokenInfo;
use crate::infrastructure::token::IssuedToken;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route(
            "/tokens",
            post(create_token).get(list_tokens).delete(revoke_token),
        )
        .route("/tokens/{token_id}", delete(revoke_token_by_id))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// `ldap` or `local`; the configured default when omitted
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub total: usize,
    pub tokens: Vec<TokenInfo>,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mode = match request.mode.as_deref() {
        Some(mode) => mode.parse::<AuthMode>().map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => state.default_auth_mode,
    };

    let identity = state
        .authenticator
        .authenticate(&request.username, &request.password, mode)
        .await?;

    let (session_token, session) = state.sessions.start(&identity).await?;

    Ok(Json(LoginResponse {
        session_token,
        expires_at: session.expires_at,
        user: identity,
    }))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    session: RequireSession,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.end(&session.token).await?;
    info!(username = %session.identity.username, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(session: RequireSession) -> Json<Identity> {
    Json(session.identity)
}

/// POST /auth/tokens
///
/// The raw token is only ever returned by this call. The body is optional.
pub async fn create_token(
    State(state): State<AppState>,
    session: RequireSession,
    body: Option<Json<CreateTokenRequest>>,
) -> Result<(StatusCode, Json<IssuedToken>), ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let issued = state
        .tokens
        .issue_token_for(&session.identity, &request.description)
        .await?;

    Ok((StatusCode::CREATED, Json(issued)))
}

/// GET /auth/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    session: RequireSession,
) -> Result<Json<TokenListResponse>, ApiError> {
    let tokens = state.tokens.list_tokens(&session.identity.username).await?;

    Ok(Json(TokenListResponse {
        total: tokens.len(),
        tokens,
    }))
}

/// DELETE /auth/tokens with `{"token": "<raw token>"}`
pub async fn revoke_token(
    State(state): State<AppState>,
    _session: RequireSession,
    Json(request): Json<RevokeTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tokens.revoke_token(request.token.trim()).await?;

    Ok(Json(MessageResponse {
        message: "Token revoked successfully".to_string(),
    }))
}

/// DELETE /auth/tokens/{token_id}
pub async fn revoke_token_by_id(
    State(state): State<AppState>,
    session: RequireSession,
    Path(token_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .tokens
        .revoke_owned_token(&session.identity.username, token_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
