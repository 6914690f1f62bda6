//! Session infrastructure

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresSessionRepository;
pub use repository::InMemorySessionRepository;
pub use service::SessionService;
