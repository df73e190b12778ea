//! Loopback network driver.
//!
//! Reaches the requested mode instantly without touching the network stack.
//! Used for local multi-instance dry runs and tests, where the interesting
//! part is the bootstrap coordination, not the transport.

use tokio::sync::mpsc::UnboundedSender;

use crate::events::SessionEvent;

use super::{DriverError, NetworkDriver, NetworkMode};

/// In-process driver that flips straight into the requested mode.
#[derive(Debug, Default)]
pub struct LoopbackDriver {
    mode: NetworkMode,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl LoopbackDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a session event channel; start calls emit the matching
    /// started event. Dropped receivers are ignored.
    pub fn with_events(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            mode: NetworkMode::Offline,
            events: Some(events),
        }
    }

    /// The mode the driver currently reports.
    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl NetworkDriver for LoopbackDriver {
    async fn start_server(&mut self) -> Result<NetworkMode, DriverError> {
        self.mode = NetworkMode::Server;
        self.emit(SessionEvent::ServerStarted);
        Ok(self.mode)
    }

    async fn start_host(&mut self) -> Result<NetworkMode, DriverError> {
        self.mode = NetworkMode::Host;
        self.emit(SessionEvent::ServerStarted);
        self.emit(SessionEvent::ClientStarted);
        Ok(self.mode)
    }

    async fn start_client(&mut self) -> Result<NetworkMode, DriverError> {
        self.mode = NetworkMode::Client;
        self.emit(SessionEvent::ClientStarted);
        Ok(self.mode)
    }
}
