//! Server-side connection admission gate.
//!
//! Invoked by the transport layer for every incoming connection request.
//! This is a coarse admission filter, not a security boundary: it bounds
//! the payload size and remembers the last payload per client, it does not
//! interpret payload content.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::{info, warn};

use crate::{ClientId, config::AdmissionConfig};

/// Outcome of a single approval request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub approved: bool,
    pub reason: String,
}

/// Per-connection admission gate with a bounded-payload check.
///
/// Connection ids may be reused across sessions, so the payload table is
/// cleared on the first approval after the connected-client count returned
/// to zero; a stale payload must never be attributed to a fresh session.
#[derive(Debug)]
pub struct ConnectionAdmission {
    max_payload_bytes: usize,
    client_payloads: HashMap<ClientId, Bytes>,
}

impl ConnectionAdmission {
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            max_payload_bytes: config.max_payload_bytes,
            client_payloads: HashMap::new(),
        }
    }

    /// Decides whether to admit `connection_id` presenting `payload`.
    ///
    /// `connected_count` is the number of clients connected before this
    /// request, as reported by the transport; zero marks the first
    /// connection of a fresh session.
    pub fn approve(
        &mut self,
        connection_id: ClientId,
        payload: Bytes,
        connected_count: usize,
    ) -> AdmissionDecision {
        let payload_len = payload.len();
        if payload_len > self.max_payload_bytes {
            // Oversized payloads are a DOS vector against the approval
            // handler itself, so they are logged, not just rejected.
            warn!(
                client = %connection_id,
                payload_len,
                max = self.max_payload_bytes,
                "possible DOS attack by client, payload too big"
            );
            return AdmissionDecision {
                approved: false,
                reason: "payload too big".into(),
            };
        }

        if connected_count == 0 {
            self.client_payloads.clear();
        }
        self.client_payloads.insert(connection_id, payload);

        info!(client = %connection_id, payload_len, "connection approved");
        AdmissionDecision {
            approved: true,
            reason: "session approves".into(),
        }
    }

    /// Last payload recorded for a connection, if it was admitted.
    pub fn client_payload(&self, connection_id: &ClientId) -> Option<&Bytes> {
        self.client_payloads.get(connection_id)
    }

    /// All payloads recorded since the session last became non-empty.
    pub fn client_payloads(&self) -> &HashMap<ClientId, Bytes> {
        &self.client_payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max_payload_bytes: usize) -> ConnectionAdmission {
        ConnectionAdmission::new(&AdmissionConfig { max_payload_bytes })
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut admission = gate(512);
        let decision = admission.approve(ClientId::new_v4(), Bytes::from(vec![0u8; 600]), 0);
        assert!(!decision.approved);
        assert_eq!(decision.reason, "payload too big");
    }

    #[test]
    fn payload_at_the_limit_is_still_admitted() {
        let mut admission = gate(512);
        let decision = admission.approve(ClientId::new_v4(), Bytes::from(vec![0u8; 512]), 0);
        assert!(decision.approved);
    }

    #[test]
    fn admitted_payload_is_recorded_and_readable() {
        let mut admission = gate(512);
        let client = ClientId::new_v4();
        let payload = Bytes::from(vec![7u8; 100]);

        let decision = admission.approve(client, payload.clone(), 0);
        assert!(decision.approved);
        assert_eq!(admission.client_payload(&client), Some(&payload));
    }

    #[test]
    fn rejected_payload_is_not_recorded() {
        let mut admission = gate(16);
        let client = ClientId::new_v4();
        admission.approve(client, Bytes::from(vec![0u8; 64]), 0);
        assert_eq!(admission.client_payload(&client), None);
    }

    #[test]
    fn table_resets_when_session_becomes_empty() {
        let mut admission = gate(512);
        let first = ClientId::new_v4();
        let second = ClientId::new_v4();

        admission.approve(first, Bytes::from_static(b"alpha"), 0);
        admission.approve(second, Bytes::from_static(b"beta"), 1);
        assert_eq!(admission.client_payloads().len(), 2);

        // Everyone disconnected; the next approval belongs to a fresh
        // session and must not see the old payloads.
        let reused = first;
        admission.approve(reused, Bytes::from_static(b"gamma"), 0);
        assert_eq!(admission.client_payloads().len(), 1);
        assert_eq!(
            admission.client_payload(&reused).map(|b| b.as_ref()),
            Some(b"gamma".as_ref())
        );
        assert_eq!(admission.client_payload(&second), None);
    }
}
