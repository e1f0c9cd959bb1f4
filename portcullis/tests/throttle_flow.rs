//! End-to-end throttling behavior over the in-memory store.
#![cfg(feature = "memory")]

use std::sync::Arc;

use chrono::{Duration, Utc};
use portcullis::{
    BlockStatus, Fingerprint, ManualClock, MemoryThrottleStore, Portcullis, ThrottleConfig,
    ThrottleStore,
};

const IDENTITY: &str = "user@example.com";
const CLIENT_IP: &str = "203.0.113.7";
const USER_AGENT: &str = "Mozilla/5.0";

type TestPortcullis = Portcullis<MemoryThrottleStore<ManualClock>, ManualClock>;

fn setup() -> (
    TestPortcullis,
    ManualClock,
    Arc<MemoryThrottleStore<ManualClock>>,
) {
    let clock = ManualClock::new(Utc::now());
    let store = Arc::new(MemoryThrottleStore::with_clock(clock.clone()));
    let portcullis =
        Portcullis::with_clock(store.clone(), ThrottleConfig::default(), clock.clone());
    (portcullis, clock, store)
}

#[tokio::test]
async fn test_block_duration_grows_with_each_failure() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, _store) = setup();

    for expected in 1..=5u32 {
        let failures = portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
        assert_eq!(failures, expected);

        let status = portcullis
            .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
        assert_eq!(status, BlockStatus::active(u64::from(expected)));

        // Let the block lapse before the next failure.
        clock.advance(Duration::seconds(i64::from(expected)));
        assert!(
            !portcullis
                .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
                .await?
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_block_lapses_exactly_after_duration() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, _store) = setup();

    for _ in 0..3 {
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
    }

    let status = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(status, BlockStatus::active(3));

    clock.advance(Duration::seconds(2));
    let status = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(status, BlockStatus::active(1));

    clock.advance(Duration::seconds(1));
    let status = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(status, BlockStatus::clear());

    Ok(())
}

#[tokio::test]
async fn test_success_resets_the_escalation() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, _store) = setup();

    for _ in 0..4 {
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
    }
    clock.advance(Duration::seconds(4));

    // Successful login clears the counter.
    portcullis
        .clear_failures(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;

    let failures = portcullis
        .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(failures, 1);

    let status = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(status, BlockStatus::active(1));

    Ok(())
}

#[tokio::test]
async fn test_fingerprints_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, _clock, _store) = setup();

    for _ in 0..2 {
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
    }
    assert!(
        portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    // Varying any one field selects a different fingerprint.
    assert!(
        !portcullis
            .is_blocked("other@example.com", CLIENT_IP, USER_AGENT)
            .await?
    );
    assert!(
        !portcullis
            .is_blocked(IDENTITY, "198.51.100.1", USER_AGENT)
            .await?
    );
    assert!(!portcullis.is_blocked(IDENTITY, CLIENT_IP, "curl/8.0").await?);

    // And failures there start their own count.
    let failures = portcullis
        .record_failure(IDENTITY, "198.51.100.1", USER_AGENT)
        .await?;
    assert_eq!(failures, 1);

    Ok(())
}

#[tokio::test]
async fn test_check_blocked_never_writes() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, store) = setup();

    for _ in 0..2 {
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
    }
    let entries_before = store.len();

    let first = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    let second = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(first, second);
    assert_eq!(store.len(), entries_before);

    // Remaining time only ever shrinks.
    clock.advance(Duration::seconds(1));
    let third = portcullis
        .check_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert!(third.remaining_seconds < second.remaining_seconds);
    assert_eq!(store.len(), entries_before);

    Ok(())
}

#[tokio::test]
async fn test_attempt_counter_expires_after_quiet_day() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, _store) = setup();

    for _ in 0..5 {
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?;
    }

    // A full day without activity wipes the counter.
    clock.advance(Duration::hours(24));
    let failures = portcullis
        .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(failures, 1);

    Ok(())
}

#[tokio::test]
async fn test_walkthrough_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, clock, _store) = setup();

    // First failure: one-second block.
    assert_eq!(
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?,
        1
    );

    clock.advance(Duration::milliseconds(500));
    assert!(
        portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    clock.advance(Duration::milliseconds(700));
    assert!(
        !portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    // Second failure: two-second block.
    assert_eq!(
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?,
        2
    );

    clock.advance(Duration::milliseconds(500));
    assert!(
        portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    clock.advance(Duration::milliseconds(1500));
    assert!(
        !portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    // Successful login: the count starts over.
    portcullis
        .clear_failures(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?,
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_malformed_store_data_fails_unblocked() -> Result<(), Box<dyn std::error::Error>> {
    let (portcullis, _clock, store) = setup();

    let fingerprint = Fingerprint::new(IDENTITY, CLIENT_IP, USER_AGENT);
    store
        .set_with_ttl(&fingerprint.block_key(), "*** trash ***", Duration::hours(1))
        .await?;
    store
        .set_with_ttl(&fingerprint.attempt_key(), "trash", Duration::hours(1))
        .await?;

    assert!(
        !portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );
    let failures = portcullis
        .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(failures, 1);

    Ok(())
}

#[tokio::test]
async fn test_disabled_throttle_never_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryThrottleStore::new());
    let portcullis = Portcullis::with_config(store.clone(), ThrottleConfig::disabled());

    assert_eq!(
        portcullis
            .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?,
        0
    );
    assert!(
        !portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );
    assert!(store.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_in_memory_constructor() -> Result<(), Box<dyn std::error::Error>> {
    let portcullis = Portcullis::in_memory();

    let failures = portcullis
        .record_failure(IDENTITY, CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(failures, 1);
    assert!(
        portcullis
            .is_blocked(IDENTITY, CLIENT_IP, USER_AGENT)
            .await?
    );

    Ok(())
}
