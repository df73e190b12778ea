//! Session lifecycle events.
//!
//! Small observable surface for what the session layer is doing: drivers
//! emit these over an unbounded channel and the embedding application logs
//! or reacts to them. [`SessionEvent::log`] routes an event through
//! `tracing` with the severity it deserves.

use tracing::{info, warn};

use crate::ClientId;

/// Lifecycle events raised by the session layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ServerStarted,
    ServerStopped { was_host: bool },
    ClientStarted,
    ClientStopped { was_host: bool },
    ClientConnected(ClientId),
    ClientDisconnected(ClientId),
    TransportFailure,
}

impl SessionEvent {
    pub fn log(&self) {
        match self {
            SessionEvent::ServerStarted => info!("=> server started"),
            SessionEvent::ServerStopped { was_host } => {
                info!(was_host, "=> server stopped")
            }
            SessionEvent::ClientStarted => info!("=> client started"),
            SessionEvent::ClientStopped { was_host } => {
                info!(was_host, "=> client stopped")
            }
            SessionEvent::ClientConnected(client) => {
                info!(%client, "=> client connected")
            }
            SessionEvent::ClientDisconnected(client) => {
                info!(%client, "=> client disconnected")
            }
            SessionEvent::TransportFailure => warn!("=> transport failure"),
        }
    }
}
