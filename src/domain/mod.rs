//! Domain layer - Core business logic and entities

pub mod auth;
pub mod error;
pub mod model;
pub mod session;
pub mod storage;
pub mod token;
pub mod user;

pub use auth::{AuthMode, AuthSource, DirectoryClient, DirectoryEntry, DirectoryError, Identity};
pub use error::DomainError;
pub use model::{ContourNames, ModelDescriptor, NetworkType};
pub use session::{Session, SessionRepository};
pub use storage::{ObjectStat, ObjectStore};
pub use token::{ApiToken, ApiTokenRepository, TokenInfo};
pub use user::{User, UserRepository};
