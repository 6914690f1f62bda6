//! Authentication infrastructure
//!
//! Local and directory password authentication, plus the LDAP client.

mod authenticator;
mod ldap;

pub use authenticator::Authenticator;
pub use ldap::LdapDirectoryClient;
