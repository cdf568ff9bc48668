//! Injectable strategies invoked around a limit check.
//!
//! Hooks never alter the core algorithm; they derive the storage key and
//! observe the resulting decision. Defaults are defined for all of them, so
//! callers only replace the ones they care about.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::store::Decision;

/// Maps a caller-supplied identity to the key stored in the counter store.
/// The default passes the identity through unchanged.
pub type KeyFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Observes a decision for a key. Invoked synchronously; keep these cheap.
pub type DecisionHook = Arc<dyn Fn(&str, &Decision) + Send + Sync>;

/// The hook set carried by a limiter.
#[derive(Clone)]
pub struct Hooks {
    /// Key derivation, applied before the store is consulted.
    pub key_fn: KeyFn,
    /// Runs after every decision, admitted or not.
    pub before: DecisionHook,
    /// Runs additionally when the decision is a rejection.
    pub on_rejected: DecisionHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            key_fn: Arc::new(|identity| identity.to_string()),
            before: Arc::new(|key, decision| {
                trace!(
                    key = %key,
                    limited = decision.limited,
                    remaining = decision.remaining,
                    "Rate limit decision"
                );
            }),
            on_rejected: Arc::new(|key, decision| {
                debug!(
                    key = %key,
                    reset_at = %decision.reset_at,
                    "Rejected by rate limit"
                );
            }),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
