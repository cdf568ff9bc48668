//! The public limiter surface.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitPolicy;
use crate::error::Result;
use crate::hooks::Hooks;
use crate::store::{CounterStore, Decision};

/// Fixed-window rate limiter over an atomic counter store.
///
/// The limiter itself holds no mutable state; all counter state lives in the
/// store, addressed by key. One instance can be shared across arbitrarily
/// many concurrent tasks without additional locking.
pub struct Limiter<S> {
    policy: RateLimitPolicy,
    store: S,
    clock: Arc<dyn Clock>,
    hooks: Hooks,
}

impl<S: CounterStore> Limiter<S> {
    /// Create a limiter, validating the policy before any check is possible.
    pub fn new(policy: RateLimitPolicy, store: S) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            store,
            clock: Arc::new(SystemClock),
            hooks: Hooks::default(),
        })
    }

    /// Replace the time source. Mainly useful for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the hook set.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check and count one call for `identity`.
    ///
    /// Exactly one atomic mutation of the key's counter state happens per
    /// call, unless the store is unreachable: with `fail_open` the call is
    /// admitted uncounted with a synthesized full-quota decision, otherwise
    /// the store error propagates to the caller.
    pub async fn limit(&self, identity: &str) -> Result<Decision> {
        let key = (self.hooks.key_fn)(identity);
        // Captured once, before the atomic step.
        let now = self.clock.now_unix();

        trace!(key = %key, "Checking rate limit");

        let decision = match self.store.evaluate(&key, &self.policy, now).await {
            Ok(decision) => decision,
            Err(e) if self.policy.fail_open => {
                warn!(key = %key, error = %e, "Counter store unavailable, failing open");
                Decision::fail_open(&self.policy, now)
            }
            Err(e) => return Err(e.into()),
        };

        (self.hooks.before)(&key, &decision);
        if decision.limited {
            (self.hooks.on_rejected)(&key, &decision);
        }

        Ok(decision)
    }
}
