//! Store trait for throttle state.
//!
//! This module defines the key-value interface the throttle keeps its attempt
//! counters and block records in. Any store with string values, per-key TTL,
//! and deletion can back it.

use async_trait::async_trait;
use chrono::Duration;

use crate::Error;

/// Key-value store with per-key expiry.
///
/// The throttle writes two kinds of entries (see
/// [`Fingerprint`](crate::Fingerprint) for the key namespaces): a decimal
/// failure counter and a JSON block record. Expiry is the store's job; the
/// throttle never deletes an expired entry itself, it only expects `get` to
/// stop returning it.
///
/// # Deployment Considerations
///
/// - Entries must expire on schedule. A store that returns values past their
///   TTL will hold blocks longer than intended.
/// - When several instances serve logins behind a load balancer, they must
///   share one store, otherwise each instance counts failures on its own.
/// - `get` followed by `set_with_ttl` is not atomic. Two concurrent failure
///   recordings can read the same counter and lose one increment; the
///   resulting undercount is bounded by the concurrency and is accepted.
#[async_trait]
pub trait ThrottleStore: Send + Sync + 'static {
    /// Fetch the value stored under `key`.
    ///
    /// # Returns
    ///
    /// `Some(value)` if the key exists and has not expired, `None` otherwise.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value, and arm the
    /// expiry timer.
    ///
    /// # Arguments
    ///
    /// * `key` - The full cache key
    /// * `value` - The value to store
    /// * `ttl` - Time until the entry expires, measured from this write
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;

    /// Remove the entry under `key`, if any. Deleting an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<(), Error>;
}
