//! Integration tests for the file-backed rendezvous channel.
//!
//! Exercises the cross-process contract on a real (temp) directory: atomic
//! publishes, concurrent followers polling the same key, and stale-record
//! cleanup between sessions.

use std::time::Duration;

use session::rendezvous::{FileRendezvous, JOIN_CODE_KEY, RendezvousChannel, RendezvousError};

const POLL: Duration = Duration::from_millis(5);

#[tokio::test]
async fn publish_then_discover_returns_the_exact_value() {
    let dir = tempfile::tempdir().unwrap();
    let channel = FileRendezvous::new(dir.path()).unwrap();

    channel.publish(JOIN_CODE_KEY, "ABC123").unwrap();
    let value = channel
        .discover(JOIN_CODE_KEY, POLL, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(value, "ABC123");
}

#[tokio::test]
async fn concurrent_followers_all_observe_the_full_value() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = FileRendezvous::new(dir.path()).unwrap();

    // Large enough that a non-atomic write would be observable in slices.
    let value: String = "ABC123".repeat(700);

    let mut followers = Vec::new();
    for _ in 0..4 {
        let channel = publisher.clone();
        followers.push(tokio::spawn(async move {
            channel
                .discover(JOIN_CODE_KEY, POLL, Duration::from_secs(2))
                .await
        }));
    }

    tokio::time::sleep(Duration::from_millis(25)).await;
    publisher.publish(JOIN_CODE_KEY, &value).unwrap();

    for follower in followers {
        let observed = follower.await.unwrap().unwrap();
        assert_eq!(observed, value, "follower saw a partial or wrong record");
    }
}

#[tokio::test]
async fn discover_without_a_publisher_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let channel = FileRendezvous::new(dir.path()).unwrap();

    let err = channel
        .discover(JOIN_CODE_KEY, POLL, Duration::from_millis(40))
        .await
        .unwrap_err();
    match err {
        RendezvousError::Timeout { key, .. } => assert_eq!(key, JOIN_CODE_KEY),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn cleared_record_does_not_leak_into_the_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let channel = FileRendezvous::new(dir.path()).unwrap();

    channel.publish(JOIN_CODE_KEY, "STALE9").unwrap();
    channel.clear(JOIN_CODE_KEY).unwrap();

    let err = channel
        .discover(JOIN_CODE_KEY, POLL, Duration::from_millis(40))
        .await
        .unwrap_err();
    assert!(matches!(err, RendezvousError::Timeout { .. }));
}

#[test]
fn two_channels_on_the_same_directory_share_records() {
    let dir = tempfile::tempdir().unwrap();
    let leader = FileRendezvous::new(dir.path()).unwrap();
    let follower = FileRendezvous::new(dir.path()).unwrap();

    leader.publish(JOIN_CODE_KEY, "ABC123").unwrap();
    assert_eq!(
        follower.read(JOIN_CODE_KEY).unwrap().as_deref(),
        Some("ABC123")
    );
}
