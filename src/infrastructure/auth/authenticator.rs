//! Password authentication against the local user table or the directory

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{error, info, warn};

use crate::domain::auth::{AuthMode, AuthSource, DirectoryClient, DirectoryError, Identity};
use crate::domain::user::UserRepository;
use crate::domain::DomainError;
use crate::infrastructure::user::PasswordHasher;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const NOT_AUTHORIZED: &str = "You are not authorized to access this application";

pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    directory: Option<Arc<dyn DirectoryClient>>,
    required_group: Option<String>,
    /// Verified against when the username is unknown so both paths cost one Argon2 run
    dummy_hash: OnceCell<String>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("directory_enabled", &self.directory.is_some())
            .field("required_group", &self.required_group)
            .finish()
    }
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            hasher,
            directory: None,
            required_group: None,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Enable directory logins, optionally restricted to members of `required_group`
    pub fn with_directory(
        mut self,
        directory: Arc<dyn DirectoryClient>,
        required_group: Option<String>,
    ) -> Self {
        self.directory = Some(directory);
        self.required_group = required_group;
        self
    }

    pub fn directory_enabled(&self) -> bool {
        self.directory.is_some()
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        mode: AuthMode,
    ) -> Result<Identity, DomainError> {
        match mode {
            AuthMode::Directory => self.authenticate_directory(username, password).await,
            AuthMode::Local => self.authenticate_local(username, password).await,
        }
    }

    pub async fn authenticate_local(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, DomainError> {
        let user = self.users.get(username).await?;

        let hash = match &user {
            Some(user) => user.password_hash(),
            None => self.dummy_hash()?,
        };
        let verified = self.hasher.verify(password, hash);

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(username = %username, "Local authentication failed");
                return Err(DomainError::invalid_credentials(INVALID_CREDENTIALS));
            }
        };

        if !user.is_active() {
            warn!(username = %username, "Inactive user attempted login");
            return Err(DomainError::account_disabled("User account is disabled"));
        }

        info!(username = %username, "Local authentication successful");
        Ok(Identity::from_user(&user, AuthSource::Local))
    }

    pub async fn authenticate_directory(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, DomainError> {
        let directory = self.directory.as_ref().ok_or_else(|| {
            DomainError::configuration("Directory authentication is not configured")
        })?;

        if username.is_empty() || password.is_empty() {
            return Err(DomainError::invalid_credentials(INVALID_CREDENTIALS));
        }

        let entry = match directory.lookup(username, password).await {
            Ok(entry) => entry,
            Err(DirectoryError::InvalidCredentials) => {
                warn!(username = %username, "LDAP bind failed");
                return Err(DomainError::invalid_credentials(INVALID_CREDENTIALS));
            }
            Err(DirectoryError::EntryNotFound(_)) => {
                warn!(username = %username, "User not found in LDAP");
                return Err(DomainError::invalid_credentials(INVALID_CREDENTIALS));
            }
            Err(DirectoryError::Unavailable(reason)) => {
                error!(username = %username, error = %reason, "LDAP authentication error");
                return Err(DomainError::storage("Authentication error"));
            }
        };

        let identity = Identity {
            username: entry.username,
            display_name: entry.display_name,
            email: entry.email,
            auth_source: AuthSource::Directory,
            groups: entry.groups,
        };

        if let Some(group) = &self.required_group {
            if !identity.is_member_of(group) {
                warn!(username = %username, required_group = %group, "User is not in required group");
                return Err(DomainError::not_authorized(NOT_AUTHORIZED));
            }
        }

        info!(username = %username, "LDAP authentication successful");
        Ok(identity)
    }

    fn dummy_hash(&self) -> Result<&str, DomainError> {
        self.dummy_hash
            .get_or_try_init(|| self.hasher.hash("dummy-password-for-timing"))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{DirectoryEntry, MockDirectoryClient};
    use crate::domain::user::User;
    use crate::infrastructure::session::InMemorySessionRepository;
    use crate::infrastructure::token::InMemoryApiTokenRepository;
    use crate::infrastructure::user::{
        Argon2Hasher, CreateUserRequest, InMemoryUserRepository, UserService,
    };

    const GROUP: &str = "cn=model-dashboard-users,ou=groups,dc=example,dc=com";

    fn hasher() -> Arc<Argon2Hasher> {
        Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap())
    }

    async fn local_authenticator() -> Authenticator {
        let hasher = hasher();
        let users = Arc::new(InMemoryUserRepository::new());

        let alice = User::new("alice", hasher.hash("correct_password").unwrap())
            .with_display_name("Alice");
        users.create(alice).await.unwrap();

        let mut bob = User::new("bob", hasher.hash("correct_password").unwrap());
        bob.set_active(false);
        users.create(bob).await.unwrap();

        Authenticator::new(users, hasher)
    }

    fn directory_authenticator(mock: MockDirectoryClient) -> Authenticator {
        Authenticator::new(Arc::new(InMemoryUserRepository::new()), hasher())
            .with_directory(Arc::new(mock), Some(GROUP.to_string()))
    }

    fn entry(username: &str, groups: &[&str]) -> DirectoryEntry {
        DirectoryEntry {
            username: username.to_string(),
            display_name: "Dana Directory".to_string(),
            email: "dana@example.com".to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_local_success() {
        let auth = local_authenticator().await;

        let identity = auth
            .authenticate("alice", "correct_password", AuthMode::Local)
            .await
            .unwrap();

        assert_eq!(identity.username, "alice");
        assert_eq!(identity.display_name, "Alice");
        assert_eq!(identity.auth_source, AuthSource::Local);
        assert_eq!(identity.groups, vec!["local-users".to_string()]);
    }

    #[tokio::test]
    async fn test_local_wrong_password_and_unknown_user_match() {
        let auth = local_authenticator().await;

        let wrong = auth
            .authenticate_local("alice", "wrong_password")
            .await
            .unwrap_err();
        let unknown = auth
            .authenticate_local("nobody", "correct_password")
            .await
            .unwrap_err();

        assert!(matches!(wrong, DomainError::InvalidCredentials { .. }));
        assert!(matches!(unknown, DomainError::InvalidCredentials { .. }));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn test_local_disabled_account() {
        let auth = local_authenticator().await;

        let err = auth
            .authenticate_local("bob", "correct_password")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountDisabled { .. }));

        // Wrong password on a disabled account reveals nothing about its state
        let wrong = auth.authenticate_local("bob", "nope").await.unwrap_err();
        assert!(matches!(wrong, DomainError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_disable_and_reenable_local_account() {
        let hasher = hasher();
        let users = Arc::new(InMemoryUserRepository::new());
        let service = UserService::new(
            users.clone(),
            Arc::new(InMemoryApiTokenRepository::new()),
            Arc::new(InMemorySessionRepository::new()),
            hasher.clone(),
        );
        let auth = Authenticator::new(users, hasher);

        service
            .create_local_user(CreateUserRequest {
                username: "carol".to_string(),
                password: "correct_password".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(auth.authenticate_local("carol", "correct_password").await.is_ok());

        service.set_active("carol", false).await.unwrap();
        let err = auth
            .authenticate_local("carol", "correct_password")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountDisabled { .. }));

        service.set_active("carol", true).await.unwrap();
        let identity = auth
            .authenticate_local("carol", "correct_password")
            .await
            .unwrap();
        assert_eq!(identity.username, "carol");
    }

    #[tokio::test]
    async fn test_directory_success() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup()
            .times(1)
            .returning(|username, _| Ok(entry(username, &[GROUP])));

        let identity = directory_authenticator(mock)
            .authenticate("dana", "secret", AuthMode::Directory)
            .await
            .unwrap();

        assert_eq!(identity.username, "dana");
        assert_eq!(identity.auth_source, AuthSource::Directory);
        assert_eq!(identity.email, "dana@example.com");
    }

    #[tokio::test]
    async fn test_directory_requires_group() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup()
            .returning(|username, _| Ok(entry(username, &["cn=other,ou=groups,dc=example,dc=com"])));

        let err = directory_authenticator(mock)
            .authenticate_directory("dana", "secret")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotAuthorized { .. }));
        assert_eq!(err.to_string(), NOT_AUTHORIZED);
    }

    #[tokio::test]
    async fn test_directory_without_required_group_accepts_anyone() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup()
            .returning(|username, _| Ok(entry(username, &[])));

        let auth = Authenticator::new(Arc::new(InMemoryUserRepository::new()), hasher())
            .with_directory(Arc::new(mock), None);

        assert!(auth.authenticate_directory("dana", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_directory_bind_failure() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup()
            .returning(|_, _| Err(DirectoryError::InvalidCredentials));

        let err = directory_authenticator(mock)
            .authenticate_directory("dana", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_directory_unreachable_is_storage_error() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup()
            .returning(|_, _| Err(DirectoryError::Unavailable("connection refused".to_string())));

        let err = directory_authenticator(mock)
            .authenticate_directory("dana", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_directory_empty_password_never_contacts_server() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_lookup().times(0);

        let err = directory_authenticator(mock)
            .authenticate_directory("dana", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn test_directory_not_configured() {
        let auth = local_authenticator().await;
        assert!(!auth.directory_enabled());

        let err = auth
            .authenticate("alice", "correct_password", AuthMode::Directory)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
