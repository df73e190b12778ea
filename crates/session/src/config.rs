//! Typed configuration sections for the session layer.
//!
//! Defaults live in `Default` impls; the embedding application overlays
//! whatever it reads from its settings store or environment. Durations are
//! stored as millisecond fields so the sections stay plain-serde types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tag labels that elect a process into a role.
///
/// Comparison against the process tag set is exact and case-sensitive, so a
/// typo in a launcher profile surfaces as "no role" instead of silently
/// matching the wrong one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleTags {
    pub server: String,
    pub host: String,
    pub client: String,
}

impl Default for RoleTags {
    fn default() -> Self {
        Self {
            server: "Server".into(),
            host: "Host".into(),
            client: "Client".into(),
        }
    }
}

/// Relay settings the leader turns into a published [`RelayDecision`].
///
/// [`RelayDecision`]: crate::bootstrap::RelayDecision
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayConfig {
    pub use_relay: bool,
    pub connection_type: String,
    /// Maximum connections accepted by the relay allocation.
    pub max_connections: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            use_relay: false,
            connection_type: "dtls".into(),
            max_connections: 4,
        }
    }
}

/// Polling and delay knobs for the bootstrap sequence.
///
/// These are explicit configuration rather than hidden constants so tests
/// can run with short intervals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between rendezvous polls.
    pub poll_interval_ms: u64,
    /// Upper bound on waiting for a leader-published record.
    pub discover_timeout_ms: u64,
    /// Fixed delay before a client starts discovery, to bias against a
    /// client racing ahead of the host during simultaneous launch.
    pub client_start_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            discover_timeout_ms: 10_000,
            client_start_delay_ms: 250,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn discover_timeout(&self) -> Duration {
        Duration::from_millis(self.discover_timeout_ms)
    }

    pub fn client_start_delay(&self) -> Duration {
        Duration::from_millis(self.client_start_delay_ms)
    }
}

/// Connection admission settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Keep this as low as possible. Approval fails for clients that send
    /// more payload bytes than this, to minimize the impact of
    /// large-payload DOS attempts against the approval handler.
    pub max_payload_bytes: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 512,
        }
    }
}

/// Aggregate configuration handed to the bootstrapper.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub tags: RoleTags,
    pub relay: RelayConfig,
    pub timing: TimingConfig,
    pub admission: AdmissionConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.tags.server, "Server");
        assert_eq!(config.tags.host, "Host");
        assert_eq!(config.tags.client, "Client");
        assert!(!config.relay.use_relay);
        assert_eq!(config.relay.connection_type, "dtls");
        assert_eq!(config.relay.max_connections, 4);
        assert_eq!(config.timing.poll_interval(), Duration::from_millis(200));
        assert_eq!(
            config.timing.client_start_delay(),
            Duration::from_millis(250)
        );
        assert_eq!(config.admission.max_payload_bytes, 512);
    }

    #[test]
    fn sections_roundtrip_through_json() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.relay.connection_type, config.relay.connection_type);
        assert_eq!(back.timing.poll_interval_ms, config.timing.poll_interval_ms);
    }
}
