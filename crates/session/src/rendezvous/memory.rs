//! In-memory rendezvous for single-process runs and tests.
//!
//! Clones share one record table, so a "host" and several "clients" living
//! in the same process can rendezvous without touching the filesystem.
//! Counterpart to the loopback network driver.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{RendezvousChannel, RendezvousError, validate_key};

/// Rendezvous channel backed by a shared in-memory table.
#[derive(Clone, Debug, Default)]
pub struct MemoryRendezvous {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryRendezvous {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RendezvousChannel for MemoryRendezvous {
    fn publish(&self, key: &str, value: &str) -> Result<(), RendezvousError> {
        validate_key(key)?;
        let mut records = self.records.lock().expect("rendezvous table poisoned");
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), RendezvousError> {
        validate_key(key)?;
        let mut records = self.records.lock().expect("rendezvous table poisoned");
        records.remove(key);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, RendezvousError> {
        validate_key(key)?;
        let records = self.records.lock().expect("rendezvous table poisoned");
        Ok(records.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const POLL: Duration = Duration::from_millis(5);

    #[test]
    fn clones_share_the_record_table() {
        let publisher = MemoryRendezvous::new();
        let reader = publisher.clone();

        publisher.publish("relay_join_code", "ABC123").unwrap();
        assert_eq!(
            reader.read("relay_join_code").unwrap().as_deref(),
            Some("ABC123")
        );
    }

    #[tokio::test]
    async fn discover_returns_published_value() {
        let channel = MemoryRendezvous::new();
        let publisher = channel.clone();

        let pending = tokio::spawn(async move {
            channel
                .discover("relay_join_code", POLL, Duration::from_secs(1))
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish("relay_join_code", "ABC123").unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), "ABC123");
    }

    #[tokio::test]
    async fn discover_times_out_on_absent_key() {
        let channel = MemoryRendezvous::new();
        let err = channel
            .discover("relay_join_code", POLL, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RendezvousError::Timeout { .. }));
    }

    #[tokio::test]
    async fn cleared_value_does_not_leak_into_next_discover() {
        let channel = MemoryRendezvous::new();
        channel.publish("relay_join_code", "STALE").unwrap();
        channel.clear("relay_join_code").unwrap();

        let err = channel
            .discover("relay_join_code", POLL, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RendezvousError::Timeout { .. }));
    }
}
