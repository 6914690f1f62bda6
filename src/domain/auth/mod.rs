//! Authentication domain - identities and the directory seam

mod directory;
mod identity;

pub use directory::{DirectoryClient, DirectoryEntry, DirectoryError};
pub use identity::{AuthMode, AuthSource, Identity, API_USERS_GROUP, LOCAL_USERS_GROUP};

#[cfg(test)]
pub use directory::MockDirectoryClient;
