//! Model Dashboard
//!
//! Metadata service for deployable inference models:
//! - Model descriptors kept in an S3-compatible bucket, cached in memory
//! - Local (Argon2) and LDAP password authentication
//! - Expiring bearer tokens for the read-only model API

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use api::state::AppState;
use config::DatabaseBackend;
use domain::auth::DirectoryClient;
use domain::session::SessionRepository;
use domain::storage::ObjectStore;
use domain::token::ApiTokenRepository;
use domain::user::UserRepository;
use domain::DomainError;
use infrastructure::auth::{Authenticator, LdapDirectoryClient};
use infrastructure::model::ModelRepository;
use infrastructure::session::{
    InMemorySessionRepository, PostgresSessionRepository, SessionService,
};
use infrastructure::storage::{connect_pool, create_object_store, InMemoryObjectStore};
use infrastructure::token::{
    InMemoryApiTokenRepository, PostgresApiTokenRepository, TokenGenerator, TokenService,
};
use infrastructure::user::{
    Argon2Hasher, InMemoryUserRepository, PasswordHasher, PostgresUserRepository, UserService,
};

/// Storage and directory backends the services are wired onto
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn ApiTokenRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub store: Arc<dyn ObjectStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub directory: Option<Arc<dyn DirectoryClient>>,
}

impl Backends {
    /// Everything in process memory, no directory
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            tokens: Arc::new(InMemoryApiTokenRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            store: Arc::new(InMemoryObjectStore::new()),
            hasher: Arc::new(Argon2Hasher::new()),
            directory: None,
        }
    }
}

/// Connect the backends selected by `config`
pub async fn connect_backends(config: &AppConfig) -> Result<Backends, DomainError> {
    config.validate()?;

    let (users, tokens, sessions): (
        Arc<dyn UserRepository>,
        Arc<dyn ApiTokenRepository>,
        Arc<dyn SessionRepository>,
    ) = match config.database.backend {
        DatabaseBackend::Postgres => {
            let pool = connect_pool(&config.database).await?;
            (
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresApiTokenRepository::new(pool.clone())),
                Arc::new(PostgresSessionRepository::new(pool)),
            )
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory credential store; users and tokens are lost on restart");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryApiTokenRepository::new()),
                Arc::new(InMemorySessionRepository::new()),
            )
        }
    };

    let store = create_object_store(&config.object_store).await?;

    let directory = config.ldap.enabled.then(|| {
        info!(server = %config.ldap.server, "LDAP authentication enabled");
        Arc::new(LdapDirectoryClient::new(&config.ldap)) as Arc<dyn DirectoryClient>
    });

    Ok(Backends {
        users,
        tokens,
        sessions,
        store,
        hasher: Arc::new(Argon2Hasher::new()),
        directory,
    })
}

/// Wire the services onto `backends`
pub fn build_state(config: &AppConfig, backends: Backends) -> AppState {
    let mut authenticator = Authenticator::new(backends.users.clone(), backends.hasher.clone());
    if let Some(directory) = backends.directory {
        authenticator = authenticator
            .with_directory(directory, config.ldap.required_group().map(str::to_string));
    }

    let tokens = TokenService::new(
        backends.tokens.clone(),
        backends.users.clone(),
        backends.hasher.clone(),
        TokenGenerator::new(&config.auth.token_prefix),
        config.auth.token_ttl(),
    );

    let sessions = SessionService::new(
        backends.sessions.clone(),
        config.auth.session_ttl(),
    );

    let users = UserService::new(
        backends.users,
        backends.tokens,
        backends.sessions,
        backends.hasher,
    );

    let models = ModelRepository::new(backends.store)
        .with_fetch_concurrency(config.object_store.fetch_concurrency);

    AppState {
        models: Arc::new(models),
        authenticator: Arc::new(authenticator),
        tokens: Arc::new(tokens),
        sessions: Arc::new(sessions),
        users: Arc::new(users),
        default_auth_mode: config.auth.default_mode,
    }
}

/// Load backends from config and build the application state
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, DomainError> {
    let backends = connect_backends(config).await?;
    Ok(build_state(config, backends))
}
