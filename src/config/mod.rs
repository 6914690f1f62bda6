//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DatabaseBackend, DatabaseConfig, LdapConfig, LogFormat, LoggingConfig,
    ObjectStoreBackend, ObjectStoreConfig, ServerConfig,
};
