//! API token infrastructure
//!
//! Token generation, storage backends and the service that issues and validates tokens.

mod generator;
mod postgres_repository;
mod repository;
mod service;

pub use generator::{hash_token, GeneratedToken, TokenGenerator};
pub use postgres_repository::PostgresApiTokenRepository;
pub use repository::InMemoryApiTokenRepository;
pub use service::{IssuedToken, TokenService};
