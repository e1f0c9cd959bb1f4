//! Block records and the status reported to callers
//!
//! A block record is the store-side payload written on every failed attempt.
//! The wire format is JSON with an epoch-seconds timestamp:
//!
//! | Field                    | Type   | Description                              |
//! | ------------------------ | ------ | ---------------------------------------- |
//! | `blocked`                | `bool` | Always `true` when written by the throttle. |
//! | `blocked_at`             | `i64`  | Epoch seconds when the block was created.   |
//! | `block_duration_seconds` | `u32`  | Block length, equal to the failure count.   |
//!
//! The record carries its own expiry data so remaining time can be computed
//! even if the store keeps the entry a little past its TTL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored representation of an active login block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub blocked: bool,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub blocked_at: DateTime<Utc>,

    pub block_duration_seconds: u32,
}

impl BlockRecord {
    /// Create a record blocking from `blocked_at` for `block_duration_seconds`.
    pub fn new(blocked_at: DateTime<Utc>, block_duration_seconds: u32) -> Self {
        Self {
            blocked: true,
            blocked_at,
            block_duration_seconds,
        }
    }

    /// The block length as a duration.
    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::from(self.block_duration_seconds))
    }

    /// The instant the block lapses.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.blocked_at + self.duration()
    }

    /// Evaluate the record against the given instant.
    ///
    /// Elapsed time is measured in whole seconds, so a block created at `t`
    /// with duration `n` reports blocked for any instant in `[t, t + n)`.
    pub fn status_at(&self, now: DateTime<Utc>) -> BlockStatus {
        if !self.blocked {
            return BlockStatus::clear();
        }
        let elapsed = (now - self.blocked_at).num_seconds();
        let remaining = i64::from(self.block_duration_seconds) - elapsed;
        if remaining > 0 {
            BlockStatus::active(remaining as u64)
        } else {
            BlockStatus::clear()
        }
    }
}

/// Whether a login attempt is currently blocked, and for how much longer.
///
/// This is a value, not an error: callers translate an active status into
/// their own rejection response (typically HTTP 429 with the remaining
/// seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatus {
    pub blocked: bool,

    /// Seconds until the block lapses. Zero when not blocked, positive
    /// otherwise.
    pub remaining_seconds: u64,
}

impl BlockStatus {
    /// Status for a fingerprint with no active block.
    pub fn clear() -> Self {
        Self {
            blocked: false,
            remaining_seconds: 0,
        }
    }

    /// Status for an active block with `remaining_seconds` left to run.
    pub fn active(remaining_seconds: u64) -> Self {
        Self {
            blocked: true,
            remaining_seconds,
        }
    }

    /// Seconds the caller should wait before retrying, if blocked.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        self.blocked.then_some(self.remaining_seconds)
    }
}
