use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        // Login sessions and token management
        .nest("/auth", auth::create_auth_router())
        // Token-protected read API
        .nest("/api/v1", v1::create_v1_router())
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Read-only cross-origin access from any origin
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}
