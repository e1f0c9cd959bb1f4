//! In-memory implementation of the throttle store.
//!
//! Entries live in a [`DashMap`] with an absolute expiry instant computed from
//! an injected clock. Expired entries are dropped lazily when read; long-lived
//! processes can additionally call [`MemoryThrottleStore::purge_expired`] from
//! a periodic task to keep the map from accumulating dead keys.
//!
//! This backend sees only its own process, so it fits tests and
//! single-instance deployments. Instances behind a load balancer need a
//! shared store instead.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use portcullis_core::{Clock, Error, SystemClock, ThrottleStore};

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory throttle store with per-key expiry.
pub struct MemoryThrottleStore<C: Clock = SystemClock> {
    entries: DashMap<String, Entry>,
    clock: C,
}

impl MemoryThrottleStore {
    /// Create a store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryThrottleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryThrottleStore<C> {
    /// Create a store reading time from the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Remove every entry whose expiry has passed.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Number of entries currently held, including not-yet-purged expired
    /// ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<C: Clock> ThrottleStore for MemoryThrottleStore<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }
}
