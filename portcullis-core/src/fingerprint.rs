//! Client fingerprinting for throttle bookkeeping
//!
//! This module derives the cache-key identity a throttle entry is tracked under.
//! A fingerprint is the SHA-256 digest of the login identity, client IP address,
//! and User-Agent value. The three fields are fed to the hash separated by NUL
//! bytes so that field boundaries are unambiguous: `("ab", "c")` and
//! `("a", "bc")` hash differently even though their plain concatenation is
//! identical.

use sha2::{Digest, Sha256};

const ATTEMPT_KEY_PREFIX: &str = "login_attempts_";
const BLOCK_KEY_PREFIX: &str = "login_block_";

/// Hex-encoded SHA-256 digest identifying one (identity, IP, user agent) tuple.
///
/// Two store keys are derived from it, one per record kind:
///
/// | Key | Record |
/// | --- | ------ |
/// | `login_attempts_<fingerprint>` | running failure count |
/// | `login_block_<fingerprint>` | active block, if any |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for a login attempt.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identifier as submitted (username or email)
    /// * `client_ip` - The client IP address as seen by the server
    /// * `user_agent` - The User-Agent header value, empty string if absent
    pub fn new(identity: &str, client_ip: &str, user_agent: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update([0u8]);
        hasher.update(client_ip.as_bytes());
        hasher.update([0u8]);
        hasher.update(user_agent.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Store key for the failure counter.
    pub fn attempt_key(&self) -> String {
        format!("{ATTEMPT_KEY_PREFIX}{}", self.0)
    }

    /// Store key for the block record.
    pub fn block_key(&self) -> String {
        format!("{BLOCK_KEY_PREFIX}{}", self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
