//! Versioned read API

pub mod models;

use axum::{routing::get, Router};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/models", get(models::list_models))
        .route("/models/{network_type}/{name}", get(models::get_model))
}
