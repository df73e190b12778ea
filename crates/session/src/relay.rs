//! Relay session broker.
//!
//! Talks to an external relay allocation service: the leader requests a new
//! allocation and turns it into a join code, followers resolve a join code
//! back into an allocation. Either way the allocation data is bound to the
//! local transport before the network session starts.

use tracing::info;
use uuid::Uuid;

/// Allocation data returned by the relay service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayAllocation {
    pub allocation_id: Uuid,
    /// Relay endpoint the transport connects through.
    pub endpoint: String,
}

/// Error type reported by a [`RelayService`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RelayServiceError {
    #[error("relay authentication failed: {0}")]
    Auth(String),

    #[error("relay service error: {0}")]
    Service(String),

    #[error("relay service call was cancelled")]
    Cancelled,
}

/// Client for the external relay allocation service.
///
/// Implementations wrap whatever SDK or HTTP surface the service exposes.
/// Cancellation coming from the underlying client must be surfaced as
/// [`RelayServiceError::Cancelled`], never swallowed.
#[allow(async_fn_in_trait)]
pub trait RelayService {
    /// Signs in anonymously. Called before every allocation or join; must
    /// tolerate being called more than once.
    async fn authenticate_anonymously(&mut self) -> Result<(), RelayServiceError>;

    /// Requests a new allocation sized for `max_connections`.
    async fn create_allocation(
        &mut self,
        max_connections: u32,
    ) -> Result<RelayAllocation, RelayServiceError>;

    /// Resolves the join code for an allocation this process created.
    async fn get_join_code(&mut self, allocation_id: Uuid) -> Result<String, RelayServiceError>;

    /// Resolves a join code published by another process into an allocation.
    async fn join_allocation(&mut self, join_code: &str)
    -> Result<RelayAllocation, RelayServiceError>;

    /// Binds allocation data to the local transport.
    fn bind_allocation(
        &mut self,
        allocation: &RelayAllocation,
        connection_type: &str,
    ) -> Result<(), RelayServiceError>;
}

/// Error type for broker operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay allocation failed: {0}")]
    AllocationFailed(#[source] RelayServiceError),

    #[error("relay join failed for code '{code}': {source}")]
    JoinFailed {
        code: String,
        #[source]
        source: RelayServiceError,
    },
}

/// Broker wrapping a [`RelayService`] with memoized authentication.
///
/// A successful sign-in is remembered for the broker's lifetime; repeated
/// allocate/join calls do not re-authenticate.
pub struct RelaySessionBroker<S: RelayService> {
    service: S,
    authenticated: bool,
}

impl<S: RelayService> RelaySessionBroker<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            authenticated: false,
        }
    }

    /// Leader path: authenticate, allocate, bind the allocation to the
    /// transport and return the join code to publish.
    pub async fn allocate(
        &mut self,
        max_connections: u32,
        connection_type: &str,
    ) -> Result<String, RelayError> {
        self.ensure_authenticated()
            .await
            .map_err(RelayError::AllocationFailed)?;

        let allocation = self
            .service
            .create_allocation(max_connections)
            .await
            .map_err(RelayError::AllocationFailed)?;
        self.service
            .bind_allocation(&allocation, connection_type)
            .map_err(RelayError::AllocationFailed)?;
        let join_code = self
            .service
            .get_join_code(allocation.allocation_id)
            .await
            .map_err(RelayError::AllocationFailed)?;

        info!(%join_code, "relay allocation created");
        Ok(join_code)
    }

    /// Follower path: authenticate, resolve the join code and bind the
    /// allocation for a client-mode connection. A bad or expired code is
    /// reported, not retried; retrying with the same code cannot succeed.
    pub async fn join(&mut self, join_code: &str, connection_type: &str) -> Result<(), RelayError> {
        let failed = |source| RelayError::JoinFailed {
            code: join_code.to_string(),
            source,
        };

        self.ensure_authenticated().await.map_err(failed)?;

        info!(%join_code, "joining relay allocation");
        let allocation = self
            .service
            .join_allocation(join_code)
            .await
            .map_err(failed)?;
        self.service
            .bind_allocation(&allocation, connection_type)
            .map_err(failed)?;
        Ok(())
    }

    async fn ensure_authenticated(&mut self) -> Result<(), RelayServiceError> {
        if !self.authenticated {
            self.service.authenticate_anonymously().await?;
            self.authenticated = true;
        }
        Ok(())
    }
}
