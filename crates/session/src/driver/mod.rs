//! Seam to the underlying network stack.
//!
//! The bootstrapper does not talk to a transport directly; it asks a
//! [`NetworkDriver`] to start in a mode and checks which mode was actually
//! reached. That check is what turns a cross-process race (two instances
//! both claiming host) into a hard error instead of a confusing
//! "client never connects" symptom later.

mod loopback;

pub use loopback::LoopbackDriver;

/// The mode the network stack reports after a start call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NetworkMode {
    #[default]
    Offline,
    Server,
    Host,
    Client,
}

impl std::fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NetworkMode::Offline => "offline",
            NetworkMode::Server => "server",
            NetworkMode::Host => "host",
            NetworkMode::Client => "client",
        };
        f.write_str(name)
    }
}

/// Error type for network start calls.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("network stack failed to start: {0}")]
    StartFailed(String),
}

/// Start primitives of the underlying network session.
///
/// Each call reports the [`NetworkMode`] the stack ended up in, which the
/// bootstrapper compares against the resolved role.
#[allow(async_fn_in_trait)]
pub trait NetworkDriver {
    async fn start_server(&mut self) -> Result<NetworkMode, DriverError>;
    async fn start_host(&mut self) -> Result<NetworkMode, DriverError>;
    async fn start_client(&mut self) -> Result<NetworkMode, DriverError>;
}
