//! API token domain

mod entity;
mod repository;

pub use entity::{ApiToken, TokenInfo, DEFAULT_TOKEN_DESCRIPTION};
pub use repository::ApiTokenRepository;
