//! Role resolution from process tags.
//!
//! Each launched instance carries a read-only set of tags assigned by the
//! test runner. Exactly one of the configured role tags may be present;
//! more than one is a configuration error, none means the process takes no
//! part in the bootstrap.

use crate::config::RoleTags;

/// The role a process plays in a bootstrap attempt.
///
/// Derived from tags on every attempt, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Server,
    Host,
    Client,
    /// Not a participant; the bootstrapper does nothing for this process.
    None,
}

/// Error type for role resolution.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("conflicting role tags {0:?}, a process may carry at most one")]
    ConflictingTags(Vec<String>),
}

/// Resolves a tag set to exactly one [`Role`].
///
/// Tag comparison is exact-string and case-sensitive; a near-miss like
/// `"server"` against the default `"Server"` does not match.
pub fn resolve(tags: &[String], role_tags: &RoleTags) -> Result<Role, RoleError> {
    let mut matched = Vec::new();
    let mut role = Role::None;

    if tags.iter().any(|tag| *tag == role_tags.server) {
        matched.push(role_tags.server.clone());
        role = Role::Server;
    }
    if tags.iter().any(|tag| *tag == role_tags.host) {
        matched.push(role_tags.host.clone());
        role = Role::Host;
    }
    if tags.iter().any(|tag| *tag == role_tags.client) {
        matched.push(role_tags.client.clone());
        role = Role::Client;
    }

    if matched.len() > 1 {
        return Err(RoleError::ConflictingTags(matched));
    }
    Ok(role)
}
