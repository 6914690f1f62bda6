//! User domain
//!
//! Local user accounts, their validation rules, and the repository trait.

mod entity;
mod repository;
mod validation;

pub use entity::User;
pub use repository::UserRepository;
pub use validation::{validate_password, validate_username, UserValidationError};
