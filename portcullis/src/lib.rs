//! # Portcullis
//!
//! Portcullis throttles failed login attempts. Every failed attempt is
//! counted per client fingerprint (identity, IP address, and user agent), and
//! the Nth consecutive failure blocks that fingerprint for N seconds. Blocks
//! and counters expire on their own in the backing store, so there is no
//! cleanup job and a well-behaved client is never more than a few seconds
//! away from another try, while a password-guessing loop grinds to a crawl.
//!
//! With Portcullis you get:
//! - Escalating, self-expiring login blocks
//! - A ready-made login pipeline policy ([`LoginGate`]) that checks the block
//!   before credentials are ever examined
//! - An explicit fail-open/fail-closed decision for store outages
//! - Deterministic tests through an injectable clock
//!
//! ## Storage Support
//!
//! Portcullis currently supports the following storage backends:
//! - In-memory (single instance, tests)
//! - Redis (shared across instances)
//!
//! Any other key-value store with per-key TTL can be plugged in by
//! implementing [`ThrottleStore`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use portcullis::Portcullis;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let portcullis = Portcullis::in_memory();
//!
//!     let status = portcullis
//!         .check_blocked("user@example.com", "203.0.113.7", "Mozilla/5.0")
//!         .await?;
//!     if status.blocked {
//!         // Reject with 429 and status.remaining_seconds
//!     }
//!
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use portcullis_core::clock::Clock;

/// Re-export core types from portcullis_core
///
/// These types are commonly used when working with the Portcullis API.
pub use portcullis_core::{
    ANONYMOUS_IDENTITY, BlockRecord, BlockStatus, CredentialVerifier, Error, Fingerprint,
    GateConfig, LoginGate, LoginOutcome, LoginThrottle, ManualClock, StoreError,
    StoreFailurePolicy, SystemClock, ThrottleConfig, ThrottleStore,
};

/// Re-export storage backends
///
/// These store implementations are available when the corresponding feature is
/// enabled.
#[cfg(feature = "memory")]
pub use portcullis_store_memory::MemoryThrottleStore;

#[cfg(feature = "redis")]
pub use portcullis_store_redis::{DEFAULT_REDIS_URL, RedisThrottleStore};

/// The main entry point for login throttling.
///
/// `Portcullis` wraps a [`LoginThrottle`] over the store of your choice and
/// exposes the three operations an authentication pipeline needs, plus a
/// [`gate`](Portcullis::gate) constructor for the full check/verify/record
/// policy.
///
/// # Example
///
/// ```rust,no_run
/// use portcullis::Portcullis;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let portcullis = Portcullis::in_memory();
///
///     // After a failed credential check:
///     let failures = portcullis
///         .record_failure("user@example.com", "203.0.113.7", "Mozilla/5.0")
///         .await?;
///     println!("failure #{failures}, blocked for {failures}s");
///
///     Ok(())
/// }
/// ```
pub struct Portcullis<S: ThrottleStore, C: Clock = SystemClock> {
    throttle: LoginThrottle<S, C>,
}

#[cfg(feature = "memory")]
impl Portcullis<MemoryThrottleStore> {
    /// Create a Portcullis instance backed by an in-memory store.
    ///
    /// State is local to this process; use the Redis backend when several
    /// instances serve logins together.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryThrottleStore::new()))
    }
}

#[cfg(feature = "redis")]
impl Portcullis<RedisThrottleStore> {
    /// Create a Portcullis instance backed by Redis.
    ///
    /// # Arguments
    ///
    /// * `url` - A `redis://` connection URL
    pub async fn redis(url: &str) -> Result<Self, Error> {
        let store = RedisThrottleStore::connect(url).await?;
        Ok(Self::new(Arc::new(store)))
    }
}

impl<S: ThrottleStore> Portcullis<S> {
    /// Create a Portcullis instance over the given store with default
    /// configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ThrottleConfig::default())
    }

    /// Create a Portcullis instance with a custom throttle configuration.
    pub fn with_config(store: Arc<S>, config: ThrottleConfig) -> Self {
        Self {
            throttle: LoginThrottle::new(store, config),
        }
    }
}

impl<S: ThrottleStore, C: Clock> Portcullis<S, C> {
    /// Create a Portcullis instance reading time from the given clock.
    pub fn with_clock(store: Arc<S>, config: ThrottleConfig, clock: C) -> Self {
        Self {
            throttle: LoginThrottle::with_clock(store, config, clock),
        }
    }

    /// Access the underlying throttle.
    pub fn throttle(&self) -> &LoginThrottle<S, C> {
        &self.throttle
    }

    /// Get the current block status for a login attempt.
    ///
    /// See [`LoginThrottle::check_blocked`].
    pub async fn check_blocked(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<BlockStatus, Error> {
        self.throttle
            .check_blocked(identity, client_ip, user_agent)
            .await
    }

    /// Check if a login attempt is currently blocked.
    pub async fn is_blocked(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<bool, Error> {
        self.throttle.is_blocked(identity, client_ip, user_agent).await
    }

    /// Record a failed login attempt and return the running failure count.
    ///
    /// See [`LoginThrottle::record_failure`].
    pub async fn record_failure(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<u32, Error> {
        self.throttle
            .record_failure(identity, client_ip, user_agent)
            .await
    }

    /// Clear the failure counter after a successful login.
    ///
    /// See [`LoginThrottle::clear_failures`].
    pub async fn clear_failures(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<(), Error> {
        self.throttle
            .clear_failures(identity, client_ip, user_agent)
            .await
    }

    /// Build a [`LoginGate`] combining this throttle with a credential
    /// verifier.
    ///
    /// # Arguments
    ///
    /// * `verifier` - The credential verification oracle
    /// * `config` - Gate behavior configuration
    pub fn gate<V: CredentialVerifier>(
        &self,
        verifier: Arc<V>,
        config: GateConfig,
    ) -> LoginGate<S, C, V>
    where
        C: Clone,
    {
        LoginGate::new(self.throttle.clone(), verifier, config)
    }
}
