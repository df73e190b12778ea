//! One-shot session bootstrap state machine.
//!
//! Resolves the process role from its tags, lets the leader (server or
//! host) publish the relay decision and join code, lets followers discover
//! both, and only then starts the underlying network session. The
//! bootstrapper is spent after a single run; `run` consumes it, so
//! re-entering a terminal attempt is not expressible.

use serde::{Deserialize, Serialize};
use tokio::{sync::oneshot, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    config::SessionConfig,
    driver::{DriverError, NetworkDriver, NetworkMode},
    relay::{RelayError, RelayService, RelaySessionBroker},
    rendezvous::{JOIN_CODE_KEY, RELAY_DECISION_KEY, RendezvousChannel, RendezvousError},
    role::{self, Role, RoleError},
};

/// Relay decision published by the leader before anything else happens.
///
/// Immutable once published; followers read it to learn whether a join code
/// will follow at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayDecision {
    pub use_relay: bool,
    pub connection_type: String,
    pub max_connections: u32,
}

impl RelayDecision {
    fn from_config(config: &SessionConfig) -> Self {
        Self {
            use_relay: config.relay.use_relay,
            connection_type: config.relay.connection_type.clone(),
            max_connections: config.relay.max_connections,
        }
    }
}

/// Terminal state of a bootstrap attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The network session started in the mode matching `role`.
    Started(Role),
    /// The process carries no role tag and takes no part in the bootstrap.
    Skipped,
    /// The attempt failed; the reason mirrors the error returned by `run`.
    Failed(String),
}

/// Error type for bootstrap attempts.
///
/// Every variant is fatal for the attempt. Only rendezvous discovery
/// retries internally (by polling up to its timeout); nothing here is
/// retried across the terminal state.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("rendezvous failed: {0}")]
    Rendezvous(#[from] RendezvousError),

    #[error("relay decision record is malformed: {0}")]
    MalformedDecision(#[from] serde_json::Error),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("role {role:?} expected to start as {expected} but network reports {actual}")]
    RoleStartMismatch {
        role: Role,
        expected: NetworkMode,
        actual: NetworkMode,
    },
}

/// Internal progress marker, logged on every transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BootstrapState {
    Idle,
    RoleResolved,
    LeaderPublishing,
    FollowerDiscovering,
    NetworkStarting,
}

/// Orchestrates one bootstrap attempt.
///
/// Construction wires in the three collaborators explicitly: the rendezvous
/// channel shared with the other instances, the relay service client and
/// the network driver. No process-wide singletons are involved.
pub struct SessionBootstrapper<C, S, D>
where
    C: RendezvousChannel,
    S: RelayService,
    D: NetworkDriver,
{
    config: SessionConfig,
    channel: C,
    broker: RelaySessionBroker<S>,
    driver: D,
    state: BootstrapState,
    completion: Option<oneshot::Sender<BootstrapOutcome>>,
}

impl<C, S, D> SessionBootstrapper<C, S, D>
where
    C: RendezvousChannel,
    S: RelayService,
    D: NetworkDriver,
{
    pub fn new(config: SessionConfig, channel: C, relay_service: S, driver: D) -> Self {
        Self {
            config,
            channel,
            broker: RelaySessionBroker::new(relay_service),
            driver,
            state: BootstrapState::Idle,
            completion: None,
        }
    }

    /// Returns a receiver that is resolved with the terminal outcome,
    /// exactly once, whether the attempt starts, skips or fails.
    pub fn completion(&mut self) -> oneshot::Receiver<BootstrapOutcome> {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(tx);
        rx
    }

    /// Runs the bootstrap attempt for the process carrying `tags`.
    ///
    /// Consumes the bootstrapper: one instance, one attempt. A fresh
    /// attempt after a failure needs a fresh bootstrapper, which clears
    /// the rendezvous keys again before doing anything else.
    pub async fn run(mut self, tags: &[String]) -> Result<BootstrapOutcome, BootstrapError> {
        let completion = self.completion.take();
        let result = self.execute(tags).await;

        let outcome = match &result {
            Ok(outcome) => outcome.clone(),
            Err(err) => BootstrapOutcome::Failed(err.to_string()),
        };
        if let Some(tx) = completion {
            let _ = tx.send(outcome);
        }
        result
    }

    /// Dedicated-server autostart: no tags, no rendezvous, relay forced
    /// off. Used by headless builds that always are the server.
    pub async fn run_dedicated(mut self) -> Result<BootstrapOutcome, BootstrapError> {
        let completion = self.completion.take();
        info!("dedicated server autostart, relay disabled");

        let result: Result<BootstrapOutcome, BootstrapError> = async {
            self.set_state(BootstrapState::NetworkStarting);
            let actual = self.driver.start_server().await?;
            Self::check_started(Role::Server, NetworkMode::Server, actual)?;
            info!("dedicated server did start");
            Ok(BootstrapOutcome::Started(Role::Server))
        }
        .await;

        let outcome = match &result {
            Ok(outcome) => outcome.clone(),
            Err(err) => BootstrapOutcome::Failed(err.to_string()),
        };
        if let Some(tx) = completion {
            let _ = tx.send(outcome);
        }
        result
    }

    async fn execute(&mut self, tags: &[String]) -> Result<BootstrapOutcome, BootstrapError> {
        let role = role::resolve(tags, &self.config.tags)?;
        self.set_state(BootstrapState::RoleResolved);

        match role {
            Role::None => {
                debug!(?tags, "no role tag present, bootstrap skipped");
                Ok(BootstrapOutcome::Skipped)
            }
            Role::Server | Role::Host => self.lead(role).await,
            Role::Client => self.follow().await,
        }
    }

    /// Leader path: clear stale records, publish the relay decision,
    /// allocate and publish the join code if relay is in use, then start.
    async fn lead(&mut self, role: Role) -> Result<BootstrapOutcome, BootstrapError> {
        // Stale records from a previous run must be gone before any
        // follower could poll them.
        self.channel.clear(JOIN_CODE_KEY)?;
        self.channel.clear(RELAY_DECISION_KEY)?;

        self.set_state(BootstrapState::LeaderPublishing);
        let decision = RelayDecision::from_config(&self.config);
        self.channel
            .publish(RELAY_DECISION_KEY, &serde_json::to_string(&decision)?)?;

        if decision.use_relay {
            info!(role = ?role, "using relay service");
            let join_code = self
                .broker
                .allocate(decision.max_connections, &decision.connection_type)
                .await?;
            self.channel.publish(JOIN_CODE_KEY, &join_code)?;
        }

        self.set_state(BootstrapState::NetworkStarting);
        info!(role = ?role, "starting network session as leader");
        let (expected, actual) = match role {
            Role::Server => (NetworkMode::Server, self.driver.start_server().await?),
            Role::Host => (NetworkMode::Host, self.driver.start_host().await?),
            _ => unreachable!("lead() is only called for server and host roles"),
        };
        Self::check_started(role, expected, actual)?;

        info!(role = ?role, "leader did start");
        Ok(BootstrapOutcome::Started(role))
    }

    /// Follower path: delay, discover the decision (and join code if relay
    /// is in use), join, then start the client.
    async fn follow(&mut self) -> Result<BootstrapOutcome, BootstrapError> {
        // Bias against a client racing ahead of the host during a
        // simultaneous launch. Reduces, does not eliminate.
        sleep(self.config.timing.client_start_delay()).await;

        self.set_state(BootstrapState::FollowerDiscovering);
        let poll = self.config.timing.poll_interval();
        let timeout = self.config.timing.discover_timeout();

        let raw = self
            .channel
            .discover(RELAY_DECISION_KEY, poll, timeout)
            .await?;
        let decision: RelayDecision = serde_json::from_str(&raw)?;

        if decision.use_relay {
            info!("waiting for relay join code");
            let join_code = self.channel.discover(JOIN_CODE_KEY, poll, timeout).await?;
            info!(%join_code, "client got relay join code");
            self.broker
                .join(&join_code, &decision.connection_type)
                .await?;
        }

        self.set_state(BootstrapState::NetworkStarting);
        info!("starting network session as client");
        let actual = self.driver.start_client().await?;
        Self::check_started(Role::Client, NetworkMode::Client, actual)?;

        info!("client did connect");
        Ok(BootstrapOutcome::Started(Role::Client))
    }

    fn check_started(
        role: Role,
        expected: NetworkMode,
        actual: NetworkMode,
    ) -> Result<(), BootstrapError> {
        if actual != expected {
            warn!(?role, %expected, %actual, "network stack started in the wrong mode");
            return Err(BootstrapError::RoleStartMismatch {
                role,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn set_state(&mut self, next: BootstrapState) {
        debug!(from = ?self.state, to = ?next, "bootstrap state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_decision_roundtrips_through_json() {
        let decision = RelayDecision {
            use_relay: true,
            connection_type: "dtls".into(),
            max_connections: 4,
        };
        let json = serde_json::to_string(&decision).unwrap();
        let back: RelayDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decision);
    }

    #[test]
    fn malformed_decision_record_is_a_bootstrap_error() {
        let err = serde_json::from_str::<RelayDecision>("not json").unwrap_err();
        let err = BootstrapError::from(err);
        assert!(matches!(err, BootstrapError::MalformedDecision(_)));
    }
}
