//! Authenticated identity types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::user::User;

/// Group granted to identities authenticated against the local user table
pub const LOCAL_USERS_GROUP: &str = "local-users";

/// Group granted to identities authenticated with an API token
pub const API_USERS_GROUP: &str = "api-users";

/// How an identity proved who it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    Directory,
    Local,
    ApiToken,
}

impl AuthSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Local => "local",
            Self::ApiToken => "api_token",
        }
    }
}

impl fmt::Display for AuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directory" | "ldap" => Ok(Self::Directory),
            "local" => Ok(Self::Local),
            "api_token" => Ok(Self::ApiToken),
            other => Err(DomainError::internal(format!("Unknown auth source '{}'", other))),
        }
    }
}

/// Password authentication backend selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    #[serde(alias = "ldap")]
    Directory,
    Local,
}

impl FromStr for AuthMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ldap" | "directory" => Ok(Self::Directory),
            "local" => Ok(Self::Local),
            other => Err(DomainError::configuration(format!(
                "Unknown authentication mode '{}'. Expected 'ldap' or 'local'",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("ldap"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Result of a successful authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub auth_source: AuthSource,
    pub groups: Vec<String>,
}

impl Identity {
    /// Identity for a local user, tagged with the given source and its fixed group
    pub fn from_user(user: &User, auth_source: AuthSource) -> Self {
        let group = match auth_source {
            AuthSource::ApiToken => API_USERS_GROUP,
            _ => LOCAL_USERS_GROUP,
        };

        Self {
            username: user.username().to_string(),
            display_name: user.label().to_string(),
            email: user.email().to_string(),
            auth_source,
            groups: vec![group.to_string()],
        }
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!("ldap".parse::<AuthMode>().unwrap(), AuthMode::Directory);
        assert_eq!("Directory".parse::<AuthMode>().unwrap(), AuthMode::Directory);
        assert_eq!("local".parse::<AuthMode>().unwrap(), AuthMode::Local);

        let err = "kerberos".parse::<AuthMode>().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_auth_mode_deserializes_ldap_alias() {
        let mode: AuthMode = serde_json::from_str("\"ldap\"").unwrap();
        assert_eq!(mode, AuthMode::Directory);
    }

    #[test]
    fn test_identity_from_user_groups() {
        let user = User::new("alice", "hash").with_email("alice@example.com");

        let local = Identity::from_user(&user, AuthSource::Local);
        assert_eq!(local.groups, vec!["local-users".to_string()]);
        assert_eq!(local.email, "alice@example.com");

        let token = Identity::from_user(&user, AuthSource::ApiToken);
        assert_eq!(token.groups, vec!["api-users".to_string()]);
        assert_eq!(token.auth_source, AuthSource::ApiToken);
    }

    #[test]
    fn test_group_membership_ignores_case() {
        let identity = Identity {
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            email: String::new(),
            auth_source: AuthSource::Directory,
            groups: vec!["CN=Model-Dashboard-Users,OU=Groups,DC=example,DC=com".to_string()],
        };

        assert!(identity.is_member_of("cn=model-dashboard-users,ou=groups,dc=example,dc=com"));
        assert!(!identity.is_member_of("cn=admins,ou=groups,dc=example,dc=com"));
    }

    #[test]
    fn test_auth_source_round_trip() {
        for source in [AuthSource::Directory, AuthSource::Local, AuthSource::ApiToken] {
            assert_eq!(source.as_str().parse::<AuthSource>().unwrap(), source);
        }
    }
}
