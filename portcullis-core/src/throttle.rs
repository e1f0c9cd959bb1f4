//! Login throttling service with escalating temporary blocks.
//!
//! This module tracks failed login attempts per client fingerprint and blocks
//! further attempts for a short, growing window: the Nth consecutive failure
//! blocks the fingerprint for N seconds. Counters live in an injected
//! key-value store and expire on their own, so a quiet day wipes the slate.
//!
//! # Features
//!
//! - Per-fingerprint failure counting (identity + IP + user agent)
//! - Block duration equal to the running failure count, in seconds
//! - Self-expiring state, no cleanup job required
//! - Counter reset on successful login
//! - Malformed store data degrades to "not blocked" instead of failing logins
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_core::{LoginThrottle, ThrottleConfig};
//!
//! let throttle = LoginThrottle::new(store, ThrottleConfig::default());
//!
//! // Check before verifying credentials
//! let status = throttle.check_blocked(identity, client_ip, user_agent).await?;
//! if status.blocked {
//!     // Reject with the remaining seconds, skip credential verification
//! }
//!
//! // Record after a failed verification
//! let failures = throttle.record_failure(identity, client_ip, user_agent).await?;
//! ```

use std::sync::Arc;

use chrono::Duration;

use crate::{
    BlockRecord, BlockStatus, Error, Fingerprint,
    clock::{Clock, SystemClock},
    error::StoreError,
    store::ThrottleStore,
};

/// Configuration for login throttling behavior.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Whether throttling is active. When disabled, nothing is recorded and
    /// nothing is ever blocked.
    pub enabled: bool,

    /// How long the failure counter survives after its last update.
    pub attempt_ttl: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempt_ttl: Duration::hours(24),
        }
    }
}

impl ThrottleConfig {
    /// Create a configuration with throttling turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set how long the failure counter survives after its last update.
    pub fn with_attempt_ttl(mut self, attempt_ttl: Duration) -> Self {
        self.attempt_ttl = attempt_ttl;
        self
    }
}

/// Service for throttling failed login attempts.
///
/// State lives entirely in the injected [`ThrottleStore`]; the service itself
/// holds no locks and every call is independent, so it can be shared freely
/// across tasks.
pub struct LoginThrottle<S: ThrottleStore, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: C,
    config: ThrottleConfig,
}

impl<S: ThrottleStore, C: Clock + Clone> Clone for LoginThrottle<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ThrottleStore> LoginThrottle<S> {
    /// Create a new LoginThrottle using the system clock.
    ///
    /// # Arguments
    ///
    /// * `store` - The store implementation holding counters and blocks
    /// * `config` - Configuration for throttling behavior
    pub fn new(store: Arc<S>, config: ThrottleConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: ThrottleStore, C: Clock> LoginThrottle<S, C> {
    /// Create a new LoginThrottle reading time from the given clock.
    pub fn with_clock(store: Arc<S>, config: ThrottleConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Check if throttling is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the current block status for a login attempt.
    ///
    /// Read-only: calling this never extends or shortens a block. A missing,
    /// expired, or unreadable block record reports as not blocked.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identifier as submitted
    /// * `client_ip` - The client IP address
    /// * `user_agent` - The User-Agent header value
    ///
    /// # Returns
    ///
    /// The current [`BlockStatus`]; `remaining_seconds` is positive whenever
    /// `blocked` is true.
    pub async fn check_blocked(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<BlockStatus, Error> {
        if !self.config.enabled {
            return Ok(BlockStatus::clear());
        }

        let fingerprint = Fingerprint::new(identity, client_ip, user_agent);
        let Some(raw) = self.store.get(&fingerprint.block_key()).await? else {
            return Ok(BlockStatus::clear());
        };

        let record: BlockRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fingerprint = %fingerprint,
                    "Ignoring malformed block record"
                );
                return Ok(BlockStatus::clear());
            }
        };

        Ok(record.status_at(self.clock.now()))
    }

    /// Check if a login attempt is currently blocked (convenience method).
    pub async fn is_blocked(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<bool, Error> {
        Ok(self
            .check_blocked(identity, client_ip, user_agent)
            .await?
            .blocked)
    }

    /// Record a failed login attempt.
    ///
    /// Increments the failure counter and rearms its expiry, then writes a
    /// fresh block record whose duration in seconds equals the new counter
    /// value. An unparseable stored counter restarts the count at zero.
    ///
    /// Counter reads and writes are not atomic across callers; concurrent
    /// recordings for the same fingerprint can settle one increment short.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identifier as submitted
    /// * `client_ip` - The client IP address
    /// * `user_agent` - The User-Agent header value
    ///
    /// # Returns
    ///
    /// The updated failure count, which is also the new block duration in
    /// seconds. Returns 0 without recording when throttling is disabled.
    pub async fn record_failure(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<u32, Error> {
        if !self.config.enabled {
            return Ok(0);
        }

        let fingerprint = Fingerprint::new(identity, client_ip, user_agent);
        let attempt_key = fingerprint.attempt_key();

        let previous = match self.store.get(&attempt_key).await? {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(count) => count,
                Err(_) => {
                    tracing::warn!(
                        fingerprint = %fingerprint,
                        value = %raw,
                        "Ignoring malformed attempt counter"
                    );
                    0
                }
            },
            None => 0,
        };
        let failures = previous.saturating_add(1);

        self.store
            .set_with_ttl(&attempt_key, &failures.to_string(), self.config.attempt_ttl)
            .await?;

        let record = BlockRecord::new(self.clock.now(), failures);
        let payload = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store
            .set_with_ttl(&fingerprint.block_key(), &payload, record.duration())
            .await?;

        tracing::warn!(
            fingerprint = %fingerprint,
            failures = failures,
            block_seconds = failures,
            "Recorded failed login attempt"
        );

        Ok(failures)
    }

    /// Clear the failure counter after a successful login.
    ///
    /// Deletes only the counter. A block that is already running is left to
    /// lapse through its own expiry, so a success during a block window does
    /// not lift the block early.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identifier as submitted
    /// * `client_ip` - The client IP address
    /// * `user_agent` - The User-Agent header value
    pub async fn clear_failures(
        &self,
        identity: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<(), Error> {
        if !self.config.enabled {
            return Ok(());
        }

        let fingerprint = Fingerprint::new(identity, client_ip, user_agent);
        self.store.delete(&fingerprint.attempt_key()).await?;

        tracing::debug!(fingerprint = %fingerprint, "Cleared failed login attempts");
        Ok(())
    }
}
