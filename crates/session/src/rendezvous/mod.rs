//! Rendezvous channel for exchanging small records between independently
//! started processes.
//!
//! The channel is the out-of-band medium through which the elected leader
//! publishes its relay decision and join code, and through which every
//! follower discovers them. Presence of a record is the synchronization
//! signal: absence means "not yet published". Exactly one process writes a
//! given key per session; readers only poll.

mod file;
mod memory;

pub use file::FileRendezvous;
pub use memory::MemoryRendezvous;

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

/// Key under which the leader publishes the serialized relay decision.
pub const RELAY_DECISION_KEY: &str = "relay_decision";

/// Key under which the leader publishes the relay join code.
pub const JOIN_CODE_KEY: &str = "relay_join_code";

/// Error type for rendezvous operations.
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    #[error("no rendezvous record for key '{key}' appeared within {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("invalid rendezvous key '{0}', keys are limited to [A-Za-z0-9._-]")]
    InvalidKey(String),

    #[error("rendezvous io for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Publish/discover primitive over a shared medium.
///
/// Publishes must be atomic from the reader's point of view: a poll either
/// sees no record or the complete value, never a truncated one. Concurrent
/// publishers to the same key are a caller-level invariant violation this
/// trait does not arbitrate.
#[allow(async_fn_in_trait)]
pub trait RendezvousChannel {
    /// Writes the record for `key`, replacing any existing value.
    fn publish(&self, key: &str, value: &str) -> Result<(), RendezvousError>;

    /// Removes the record for `key` if present. Callers clear their keys at
    /// the very start of a new bootstrap attempt so a follower never reads
    /// a leftover value from a prior run.
    fn clear(&self, key: &str) -> Result<(), RendezvousError>;

    /// Returns the current value for `key`, or `None` if not yet published.
    fn read(&self, key: &str) -> Result<Option<String>, RendezvousError>;

    /// Polls `key` at `poll_interval` until a record exists, then returns
    /// its value. Suspends only the calling task between polls. Fails with
    /// [`RendezvousError::Timeout`] if nothing appears within `timeout`.
    async fn discover(
        &self,
        key: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<String, RendezvousError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.read(key)? {
                return Ok(value);
            }
            if Instant::now() + poll_interval > deadline {
                return Err(RendezvousError::Timeout {
                    key: key.to_string(),
                    timeout,
                });
            }
            trace!(key, "rendezvous record not present yet, polling again");
            sleep(poll_interval).await;
        }
    }
}

/// Keys double as file names on the file backend, so both backends enforce
/// the same restricted alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), RendezvousError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(RendezvousError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation_accepts_well_known_keys() {
        assert!(validate_key(RELAY_DECISION_KEY).is_ok());
        assert!(validate_key(JOIN_CODE_KEY).is_ok());
    }

    #[test]
    fn key_validation_rejects_path_like_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key("nested/key").is_err());
    }
}
