//! Redis implementation of the throttle store.
//!
//! Counters and block records map directly onto Redis strings with `SET EX`
//! expiry, so Redis enforces the TTL contract natively and instances behind a
//! load balancer share one view of the attempt history.
//!
//! Connections go through [`redis::aio::ConnectionManager`], which
//! reconnects on its own; each operation works on a cheap clone of the
//! manager.

use async_trait::async_trait;
use chrono::Duration;
use portcullis_core::{Error, StoreError, ThrottleStore};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Redis-backed throttle store.
#[derive(Clone)]
pub struct RedisThrottleStore {
    manager: ConnectionManager,
}

impl RedisThrottleStore {
    /// Create a store from an established connection manager.
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Connect to Redis at the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - A `redis://` connection URL
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(|e| {
            tracing::error!(error = %e, "Invalid Redis URL");
            StoreError::Connection("Invalid Redis URL".to_string())
        })?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to Redis");
            StoreError::Connection("Failed to connect to Redis".to_string())
        })?;

        Ok(Self::new(manager))
    }

    /// Verify the server is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Redis health check failed");
                StoreError::Unavailable("Redis health check failed".to_string())
            })?;
        Ok(())
    }
}

#[async_trait]
impl ThrottleStore for RedisThrottleStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to read throttle key");
            StoreError::Unavailable("Failed to read throttle key".to_string())
        })?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        // SET EX rejects zero, so sub-second TTLs round up to one second.
        let seconds = ttl.num_seconds().max(1) as u64;

        let mut conn = self.manager.clone();
        let _: () = conn.set_ex(key, value, seconds).await.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to write throttle key");
            StoreError::Unavailable("Failed to write throttle key".to_string())
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(key).await.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Failed to delete throttle key");
            StoreError::Unavailable("Failed to delete throttle key".to_string())
        })?;
        Ok(())
    }
}
