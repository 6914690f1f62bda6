//! Model descriptor repository

mod repository;

pub use repository::{AddOutcome, ModelRepository};
