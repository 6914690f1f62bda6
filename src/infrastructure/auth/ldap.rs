//! LDAP directory client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{dn_escape, ldap_escape, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};

use crate::config::LdapConfig;
use crate::domain::auth::{DirectoryClient, DirectoryEntry, DirectoryError};

/// LDAP result code for a refused simple bind
const INVALID_CREDENTIALS_RC: u32 = 49;

/// Binds as the user over a fresh connection per lookup
#[derive(Debug, Clone)]
pub struct LdapDirectoryClient {
    server: String,
    base_dn: String,
    user_dn_template: String,
    search_filter: String,
    group_attribute: String,
    connect_timeout: Duration,
}

impl LdapDirectoryClient {
    pub fn new(config: &LdapConfig) -> Self {
        Self {
            server: config.server.clone(),
            base_dn: config.base_dn.clone(),
            user_dn_template: config.user_dn_template.clone(),
            search_filter: config.search_filter.clone(),
            group_attribute: config.group_attribute.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    fn bind_dn(&self, username: &str) -> String {
        self.user_dn_template
            .replace("{username}", &dn_escape(username))
    }

    fn filter(&self, username: &str) -> String {
        self.search_filter
            .replace("{username}", &ldap_escape(username))
    }

    fn entry_from_attrs(
        &self,
        username: &str,
        attrs: &HashMap<String, Vec<String>>,
    ) -> DirectoryEntry {
        DirectoryEntry {
            username: username.to_string(),
            display_name: first_value(attrs, "displayName")
                .unwrap_or(username)
                .to_string(),
            email: first_value(attrs, "mail").unwrap_or_default().to_string(),
            groups: attribute(attrs, &self.group_attribute)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectoryClient {
    async fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryEntry, DirectoryError> {
        // An empty password would be accepted as an unauthenticated bind
        if password.is_empty() {
            return Err(DirectoryError::InvalidCredentials);
        }

        let settings = LdapConnSettings::new().set_conn_timeout(self.connect_timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.server)
            .await
            .map_err(unavailable)?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection closed with error");
            }
        });

        let bind = ldap
            .simple_bind(&self.bind_dn(username), password)
            .await
            .map_err(unavailable)?;

        if bind.rc == INVALID_CREDENTIALS_RC {
            debug!(username = %username, "LDAP bind refused");
            return Err(DirectoryError::InvalidCredentials);
        }
        bind.success().map_err(unavailable)?;

        let attributes = vec!["cn", "mail", "displayName", self.group_attribute.as_str()];
        let (entries, _) = ldap
            .search(&self.base_dn, Scope::Subtree, &self.filter(username), attributes)
            .await
            .map_err(unavailable)?
            .success()
            .map_err(unavailable)?;

        let entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or_else(|| DirectoryError::EntryNotFound(username.to_string()))?;

        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }

        Ok(self.entry_from_attrs(username, &entry.attrs))
    }
}

fn unavailable(e: ldap3::LdapError) -> DirectoryError {
    DirectoryError::Unavailable(e.to_string())
}

/// Attribute names are case-insensitive
fn attribute<'a>(attrs: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a Vec<String>> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values)
}

fn first_value<'a>(attrs: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
    attribute(attrs, name)
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
