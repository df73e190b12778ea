//! Session bootstrap layer for local multi-instance multiplayer runs.
//!
//! When several local processes (server, host, clients) launch simultaneously
//! they have to agree on who plays which role, let exactly one of them
//! allocate a relay session, and let every client discover the resulting join
//! code before it connects. This crate carries that coordinator plus the
//! small server-side admission gate that goes with it.
//!
//! The moving parts, leaf first:
//! - [`role`] resolves a process tag set to exactly one role.
//! - [`rendezvous`] exchanges small records between independently started
//!   processes, with polling discovery and atomic publishes.
//! - [`relay`] brokers allocations against an external relay service.
//! - [`bootstrap`] orchestrates the above into a one-shot state machine.
//! - [`admission`] gates incoming connections by payload size.
//! - [`driver`] is the seam to the actual network stack; a loopback driver
//!   is included for in-process runs and tests.

pub mod admission;
pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod events;
pub mod relay;
pub mod rendezvous;
pub mod role;

/// Represents the id of a client on the server.
pub type ClientId = uuid::Uuid;

pub use admission::{AdmissionDecision, ConnectionAdmission};
pub use bootstrap::{BootstrapError, BootstrapOutcome, RelayDecision, SessionBootstrapper};
pub use config::SessionConfig;
pub use driver::{DriverError, NetworkDriver, NetworkMode};
pub use events::SessionEvent;
pub use relay::{RelayError, RelayService, RelaySessionBroker};
pub use rendezvous::{RendezvousChannel, RendezvousError};
pub use role::{Role, RoleError};
