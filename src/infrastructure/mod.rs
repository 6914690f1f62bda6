//! Infrastructure layer - External service implementations

pub mod auth;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;
pub mod token;
pub mod user;
