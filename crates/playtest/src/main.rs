//! Local multi-instance bootstrap launcher.
//!
//! Start several copies of this binary at once, each with its own tags, and
//! they will rendezvous through a shared directory:
//!
//! ```text
//! PLAYTEST_TAGS=Host PLAYTEST_USE_RELAY=1 playtest &
//! PLAYTEST_TAGS=Client playtest &
//! PLAYTEST_TAGS=Client playtest &
//! ```
//!
//! Environment surface:
//! - `PLAYTEST_TAGS` — comma-separated tag set for this instance.
//! - `PLAYTEST_DIR` — shared exchange directory (defaults to
//!   `<tmp>/playtest-rendezvous`).
//! - `PLAYTEST_USE_RELAY` — `1`/`true` lets the leader allocate a (stub)
//!   relay session and publish its join code.
//! - `PLAYTEST_DEDICATED` — `1`/`true` runs the dedicated-server path,
//!   ignoring tags and relay.

use color_eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};
use uuid::Uuid;

use session::bootstrap::{BootstrapOutcome, SessionBootstrapper};
use session::config::SessionConfig;
use session::driver::LoopbackDriver;
use session::relay::{RelayAllocation, RelayService, RelayServiceError};
use session::rendezvous::FileRendezvous;

/// Stand-in for a real relay service: fabricates allocations locally and
/// derives short join codes from the allocation id. Good enough to exercise
/// the full leader/follower sequencing without any backend.
#[derive(Default)]
struct StubRelayService;

impl RelayService for StubRelayService {
    async fn authenticate_anonymously(&mut self) -> Result<(), RelayServiceError> {
        Ok(())
    }

    async fn create_allocation(
        &mut self,
        max_connections: u32,
    ) -> Result<RelayAllocation, RelayServiceError> {
        info!(max_connections, "stub relay allocation created");
        Ok(RelayAllocation {
            allocation_id: Uuid::new_v4(),
            endpoint: "127.0.0.1:7777".into(),
        })
    }

    async fn get_join_code(&mut self, allocation_id: Uuid) -> Result<String, RelayServiceError> {
        let code = allocation_id.simple().to_string()[..6].to_uppercase();
        Ok(code)
    }

    async fn join_allocation(
        &mut self,
        join_code: &str,
    ) -> Result<RelayAllocation, RelayServiceError> {
        if join_code.len() != 6 {
            return Err(RelayServiceError::Service(format!(
                "malformed join code '{join_code}'"
            )));
        }
        Ok(RelayAllocation {
            allocation_id: Uuid::new_v4(),
            endpoint: "127.0.0.1:7777".into(),
        })
    }

    fn bind_allocation(
        &mut self,
        allocation: &RelayAllocation,
        connection_type: &str,
    ) -> Result<(), RelayServiceError> {
        info!(endpoint = %allocation.endpoint, connection_type, "bound relay allocation");
        Ok(())
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.as_str(), "1" | "true" | "True"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let tags: Vec<String> = std::env::var("PLAYTEST_TAGS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    let exchange_dir = std::env::var("PLAYTEST_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("playtest-rendezvous"));

    let mut config = SessionConfig::default();
    config.relay.use_relay = env_flag("PLAYTEST_USE_RELAY");

    info!(?tags, dir = %exchange_dir.display(), use_relay = config.relay.use_relay, "playtest instance starting");

    let channel = FileRendezvous::new(&exchange_dir)?;

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            session::SessionEvent::log(&event);
        }
    });

    let mut bootstrapper = SessionBootstrapper::new(
        config,
        channel,
        StubRelayService,
        LoopbackDriver::with_events(events_tx),
    );
    let completion = bootstrapper.completion();

    let result = if env_flag("PLAYTEST_DEDICATED") {
        bootstrapper.run_dedicated().await
    } else {
        bootstrapper.run(&tags).await
    };

    match result {
        Ok(BootstrapOutcome::Started(role)) => info!(?role, "bootstrap finished"),
        Ok(BootstrapOutcome::Skipped) => warn!("no role tag matched, nothing to do"),
        Ok(BootstrapOutcome::Failed(reason)) => unreachable!("run reported Failed as Ok: {reason}"),
        Err(err) => return Err(err.into()),
    }

    // The one-shot completion mirrors what run already returned; drain it so
    // the sender side is observed at least once in a real composition.
    if let Ok(outcome) = completion.await {
        info!(?outcome, "completion signal received");
    }

    Ok(())
}
