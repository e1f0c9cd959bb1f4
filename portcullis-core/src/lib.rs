//! Core functionality for the portcullis project
//!
//! This crate contains the login throttling service and the traits it is
//! wired up with. Failed login attempts are counted per client fingerprint
//! (identity, IP address, and user agent) and every failure blocks the
//! fingerprint for as many seconds as it has accumulated failures. All state
//! lives in a pluggable key-value store with per-key expiry, so blocks and
//! counters clean themselves up.
//!
//! See [`LoginThrottle`] for the throttling operations, [`ThrottleStore`] for
//! the store contract, and [`LoginGate`] for the ready-made login pipeline
//! policy built on top of them. Store backends live in their own crates and
//! are re-exported by the `portcullis` crate.

pub mod block;
pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod store;
pub mod throttle;

pub use block::{BlockRecord, BlockStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, StoreError};
pub use fingerprint::Fingerprint;
pub use gate::{
    ANONYMOUS_IDENTITY, CredentialVerifier, GateConfig, LoginGate, LoginOutcome,
    StoreFailurePolicy,
};
pub use store::ThrottleStore;
pub use throttle::{LoginThrottle, ThrottleConfig};
