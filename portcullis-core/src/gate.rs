//! Login pipeline policy
//!
//! This module fixes the order in which an authentication pipeline talks to
//! the throttle:
//!
//! 1. Check the block status first. A blocked attempt is rejected before any
//!    credential work happens, so blocked clients learn nothing about the
//!    password they sent.
//! 2. Verify credentials through the injected [`CredentialVerifier`].
//! 3. On failure, record the attempt and report the running count.
//! 4. On success, clear the counter.
//!
//! The gate also owns the decision of what happens when the store is down:
//! [`StoreFailurePolicy::FailClosed`] (default) propagates the error and the
//! login does not proceed, [`StoreFailurePolicy::FailOpen`] logs it and
//! continues as if no throttle were configured.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    BlockStatus, Error,
    clock::Clock,
    store::ThrottleStore,
    throttle::LoginThrottle,
};

/// Identity recorded for login attempts that carry no identifier at all.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Credential verification oracle.
///
/// Implementations check a submitted secret against whatever credential store
/// the application uses. `Ok(false)` means the credentials do not match;
/// errors are reserved for infrastructure failures of the verifier itself.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, Error>;
}

/// What the gate does when the throttle store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Propagate the store error; the login attempt does not proceed.
    #[default]
    FailClosed,

    /// Log the store error and continue without throttling.
    FailOpen,
}

/// Configuration for the login gate.
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    pub store_failure_policy: StoreFailurePolicy,
}

impl GateConfig {
    /// Set the policy applied when the throttle store errors.
    pub fn with_store_failure_policy(mut self, policy: StoreFailurePolicy) -> Self {
        self.store_failure_policy = policy;
        self
    }
}

/// Result of a gated login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials verified; the failure counter has been cleared.
    Granted,

    /// Credentials rejected. `failed_attempts` carries the running failure
    /// count, or `None` when the store was unavailable under
    /// [`StoreFailurePolicy::FailOpen`].
    Denied { failed_attempts: Option<u32> },

    /// The attempt is blocked; credentials were not examined.
    Throttled { retry_after_seconds: u64 },
}

impl LoginOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, LoginOutcome::Granted)
    }
}

/// Login pipeline combining throttle checks with credential verification.
pub struct LoginGate<S: ThrottleStore, C: Clock, V: CredentialVerifier> {
    throttle: LoginThrottle<S, C>,
    verifier: Arc<V>,
    config: GateConfig,
}

impl<S: ThrottleStore, C: Clock, V: CredentialVerifier> LoginGate<S, C, V> {
    /// Create a new LoginGate.
    ///
    /// # Arguments
    ///
    /// * `throttle` - The throttle tracking failures and blocks
    /// * `verifier` - The credential verification oracle
    /// * `config` - Gate behavior configuration
    pub fn new(throttle: LoginThrottle<S, C>, verifier: Arc<V>, config: GateConfig) -> Self {
        Self {
            throttle,
            verifier,
            config,
        }
    }

    /// Access the underlying throttle.
    pub fn throttle(&self) -> &LoginThrottle<S, C> {
        &self.throttle
    }

    /// Run one login attempt through the gate.
    ///
    /// An empty `identity` is tracked under [`ANONYMOUS_IDENTITY`] so that
    /// identifier-less probing still accumulates a counter.
    ///
    /// # Arguments
    ///
    /// * `identity` - The login identifier as submitted
    /// * `secret` - The submitted secret
    /// * `client_ip` - The client IP address
    /// * `user_agent` - The User-Agent header value
    ///
    /// # Returns
    ///
    /// The [`LoginOutcome`]; store errors surface here only under
    /// [`StoreFailurePolicy::FailClosed`].
    pub async fn attempt_login(
        &self,
        identity: &str,
        secret: &str,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<LoginOutcome, Error> {
        let identity = if identity.is_empty() {
            ANONYMOUS_IDENTITY
        } else {
            identity
        };

        match self
            .throttle
            .check_blocked(identity, client_ip, user_agent)
            .await
        {
            Ok(BlockStatus { blocked: true, remaining_seconds }) => {
                return Ok(LoginOutcome::Throttled {
                    retry_after_seconds: remaining_seconds,
                });
            }
            Ok(_) => {}
            Err(e) if self.fails_open() => {
                tracing::error!(error = %e, "Skipping block check, throttle store unavailable");
            }
            Err(e) => return Err(e),
        }

        let verified = self.verifier.verify(identity, secret).await?;

        if verified {
            match self
                .throttle
                .clear_failures(identity, client_ip, user_agent)
                .await
            {
                Ok(()) => {}
                Err(e) if self.fails_open() => {
                    tracing::error!(error = %e, "Failure counter not cleared, throttle store unavailable");
                }
                Err(e) => return Err(e),
            }
            Ok(LoginOutcome::Granted)
        } else {
            match self
                .throttle
                .record_failure(identity, client_ip, user_agent)
                .await
            {
                Ok(failures) => Ok(LoginOutcome::Denied {
                    failed_attempts: Some(failures),
                }),
                Err(e) if self.fails_open() => {
                    tracing::error!(error = %e, "Failure not recorded, throttle store unavailable");
                    Ok(LoginOutcome::Denied {
                        failed_attempts: None,
                    })
                }
                Err(e) => Err(e),
            }
        }
    }

    fn fails_open(&self) -> bool {
        self.config.store_failure_policy == StoreFailurePolicy::FailOpen
    }
}
