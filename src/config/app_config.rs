use chrono::Duration;
use serde::Deserialize;

use crate::domain::{AuthMode, DomainError};

/// Longest accepted API token lifetime (about a century)
pub const MAX_TOKEN_TTL_DAYS: i64 = 36_500;

/// Longest accepted login session
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub ldap: LdapConfig,
    pub object_store: ObjectStoreConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Backend used by `/auth/login` when the request does not name one
    pub default_mode: AuthMode,
    pub token_ttl_days: i64,
    pub session_ttl_hours: i64,
    /// Prefix prepended to generated API tokens
    pub token_prefix: String,
}

/// Directory (LDAP) settings. `{username}` is substituted in the templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LdapConfig {
    pub enabled: bool,
    pub server: String,
    pub base_dn: String,
    pub user_dn_template: String,
    pub search_filter: String,
    /// Empty disables the group check
    pub required_group: String,
    pub group_attribute: String,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    #[default]
    S3,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub backend: ObjectStoreBackend,
    /// `host:port` or full URL; bare hosts are treated as plain HTTP
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub force_path_style: bool,
    /// Concurrent object fetches during a refresh
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Falls back to the `DATABASE_URL` environment variable when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_mode: AuthMode::Directory,
            token_ttl_days: 30,
            session_ttl_hours: 12,
            token_prefix: "mdt_".to_string(),
        }
    }
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server: "ldap://ldap.example.com:389".to_string(),
            base_dn: "dc=example,dc=com".to_string(),
            user_dn_template: "uid={username},ou=users,dc=example,dc=com".to_string(),
            search_filter: "(uid={username})".to_string(),
            required_group: "cn=model-dashboard-users,ou=groups,dc=example,dc=com".to_string(),
            group_attribute: "memberOf".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            backend: ObjectStoreBackend::default(),
            endpoint: Some("localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            bucket: "argo-models".to_string(),
            access_key: None,
            secret_key: None,
            force_path_style: true,
            fetch_concurrency: 8,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

impl AuthConfig {
    /// Token lifetime, clamped so expiry arithmetic cannot overflow
    pub fn token_ttl(&self) -> Duration {
        Duration::days(
            self.token_ttl_days
                .clamp(-MAX_TOKEN_TTL_DAYS, MAX_TOKEN_TTL_DAYS),
        )
    }

    /// Session lifetime, clamped like [`AuthConfig::token_ttl`]
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(
            self.session_ttl_hours
                .clamp(-MAX_SESSION_TTL_HOURS, MAX_SESSION_TTL_HOURS),
        )
    }
}

impl LdapConfig {
    pub fn required_group(&self) -> Option<&str> {
        let group = self.required_group.trim();
        (!group.is_empty()).then_some(group)
    }
}

impl DatabaseConfig {
    /// Connection URL from config or `DATABASE_URL`
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that cannot work together
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.auth.token_ttl_days) {
            return Err(DomainError::configuration(format!(
                "auth.token_ttl_days must be between 1 and {}",
                MAX_TOKEN_TTL_DAYS
            )));
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(DomainError::configuration(format!(
                "auth.session_ttl_hours must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }

        if self.auth.default_mode == AuthMode::Directory && !self.ldap.enabled {
            return Err(DomainError::configuration(
                "auth.default_mode is 'ldap' but the directory is disabled",
            ));
        }

        if self.ldap.enabled && !self.ldap.user_dn_template.contains("{username}") {
            return Err(DomainError::configuration(
                "ldap.user_dn_template must contain '{username}'",
            ));
        }

        if self.object_store.bucket.trim().is_empty() {
            return Err(DomainError::configuration("object_store.bucket must be set"));
        }

        if self.object_store.access_key.is_some() != self.object_store.secret_key.is_some() {
            return Err(DomainError::configuration(
                "object_store requires both access_key and secret_key when either is set",
            ));
        }

        if self.object_store.fetch_concurrency == 0 {
            return Err(DomainError::configuration(
                "object_store.fetch_concurrency must be at least 1",
            ));
        }

        if self.database.backend == DatabaseBackend::Postgres
            && self.database.resolved_url().is_none()
        {
            return Err(DomainError::configuration(
                "database.url (or DATABASE_URL) is required for the postgres backend",
            ));
        }

        Ok(())
    }
}
