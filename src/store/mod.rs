//! Atomic counter store backends and the per-call decision value.

mod memory;
mod window;

#[cfg(feature = "redis")]
mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::RateLimitPolicy;

pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use self::redis::{RedisStore, RedisStoreConfig};

/// Errors that can occur while talking to a counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the request failed.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The per-call deadline elapsed before the store answered.
    #[error("Store request timed out")]
    Timeout,

    /// The store answered with an unexpected shape.
    #[error("Malformed store response: {0}")]
    MalformedResponse(String),
}

/// Outcome of one rate limit check.
///
/// Produced fresh on every call, never persisted. `remaining` is clamped at
/// zero for rejected calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The configured quota per window.
    pub limit: u32,
    /// Hits left in the current window after this call.
    pub remaining: u32,
    /// When the current window ends and a fresh one begins.
    pub reset_at: DateTime<Utc>,
    /// Whether this call must be rejected.
    pub limited: bool,
}

impl Decision {
    pub(crate) fn new(limit: u32, remaining: u32, reset_unix: i64, limited: bool) -> Self {
        Self {
            limit,
            remaining,
            reset_at: DateTime::from_timestamp(reset_unix, 0).unwrap_or(DateTime::UNIX_EPOCH),
            limited,
        }
    }

    /// The decision synthesized when the store is unreachable and the policy
    /// fails open: admit without counting, full quota remaining, reset one
    /// window ahead.
    pub(crate) fn fail_open(policy: &RateLimitPolicy, now: i64) -> Self {
        Self::new(policy.max_hits, policy.max_hits, now + policy.window(), false)
    }
}

/// Per-key counter state persisted in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    /// Start of the current counting window, unix seconds.
    pub window_start: i64,
    /// Hits recorded since `window_start`.
    pub hit_count: u32,
}

/// Capability trait for atomic keyed counter stores.
///
/// A store runs the whole fixed-window evaluation for one key as a single
/// indivisible step: read the window, reset it if elapsed, compare the count
/// against the quota, and increment on admission. No other call's
/// read-modify-write may interleave between this call's read and its write
/// for the same key. That atomicity is the correctness-critical property of
/// the limiter; backends provide it with an entry lock ([`MemoryStore`]) or a
/// server-side script (`RedisStore`).
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Evaluate and update the counter for `key` at instant `now`.
    ///
    /// `now` is captured once by the caller, before the atomic step, so
    /// concurrent evaluations in the same instant share a time reference.
    async fn evaluate(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: i64,
    ) -> Result<Decision, StoreError>;
}
