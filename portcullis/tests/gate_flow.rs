//! Gated login pipeline over the in-memory store.
#![cfg(feature = "memory")]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use portcullis::{
    CredentialVerifier, Error, GateConfig, LoginGate, LoginOutcome, ManualClock,
    MemoryThrottleStore, Portcullis, ThrottleConfig,
};

const CLIENT_IP: &str = "203.0.113.7";
const USER_AGENT: &str = "Mozilla/5.0";

/// Verifier accepting exactly one identity/secret pair.
struct FixedCredentials {
    identity: &'static str,
    secret: &'static str,
}

#[async_trait]
impl CredentialVerifier for FixedCredentials {
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, Error> {
        Ok(identity == self.identity && secret == self.secret)
    }
}

type TestGate = LoginGate<MemoryThrottleStore<ManualClock>, ManualClock, FixedCredentials>;

fn setup() -> (TestGate, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let store = Arc::new(MemoryThrottleStore::with_clock(clock.clone()));
    let portcullis = Portcullis::with_clock(store, ThrottleConfig::default(), clock.clone());
    let verifier = Arc::new(FixedCredentials {
        identity: "user@example.com",
        secret: "hunter2",
    });
    (portcullis.gate(verifier, GateConfig::default()), clock)
}

#[tokio::test]
async fn test_gate_flow_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let (gate, clock) = setup();

    // Wrong password: denied, one failure on the books.
    let outcome = gate
        .attempt_login("user@example.com", "wrong", CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        outcome,
        LoginOutcome::Denied {
            failed_attempts: Some(1)
        }
    );

    // Immediately retrying with the right password is still throttled.
    let outcome = gate
        .attempt_login("user@example.com", "hunter2", CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        outcome,
        LoginOutcome::Throttled {
            retry_after_seconds: 1
        }
    );

    // Once the block lapses the right password gets in.
    clock.advance(Duration::seconds(1));
    let outcome = gate
        .attempt_login("user@example.com", "hunter2", CLIENT_IP, USER_AGENT)
        .await?;
    assert!(outcome.is_granted());

    // The slate is clean: a new failure starts over at one.
    let outcome = gate
        .attempt_login("user@example.com", "wrong", CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        outcome,
        LoginOutcome::Denied {
            failed_attempts: Some(1)
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_retry_after_counts_down() -> Result<(), Box<dyn std::error::Error>> {
    let (gate, clock) = setup();

    // Three spaced-out failures escalate the block to three seconds.
    for expected in 1..=3u32 {
        let outcome = gate
            .attempt_login("user@example.com", "wrong", CLIENT_IP, USER_AGENT)
            .await?;
        assert_eq!(
            outcome,
            LoginOutcome::Denied {
                failed_attempts: Some(expected)
            }
        );
        if expected < 3 {
            clock.advance(Duration::seconds(i64::from(expected)));
        }
    }

    let outcome = gate
        .attempt_login("user@example.com", "hunter2", CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        outcome,
        LoginOutcome::Throttled {
            retry_after_seconds: 3
        }
    );

    clock.advance(Duration::seconds(1));
    let outcome = gate
        .attempt_login("user@example.com", "hunter2", CLIENT_IP, USER_AGENT)
        .await?;
    assert_eq!(
        outcome,
        LoginOutcome::Throttled {
            retry_after_seconds: 2
        }
    );

    clock.advance(Duration::seconds(2));
    let outcome = gate
        .attempt_login("user@example.com", "hunter2", CLIENT_IP, USER_AGENT)
        .await?;
    assert!(outcome.is_granted());

    Ok(())
}

#[tokio::test]
async fn test_anonymous_probing_accumulates() -> Result<(), Box<dyn std::error::Error>> {
    let (gate, clock) = setup();

    // Requests without an identifier still build up a count.
    let outcome = gate.attempt_login("", "wrong", CLIENT_IP, USER_AGENT).await?;
    assert_eq!(
        outcome,
        LoginOutcome::Denied {
            failed_attempts: Some(1)
        }
    );

    clock.advance(Duration::seconds(1));
    let outcome = gate.attempt_login("", "wrong", CLIENT_IP, USER_AGENT).await?;
    assert_eq!(
        outcome,
        LoginOutcome::Denied {
            failed_attempts: Some(2)
        }
    );

    Ok(())
}
