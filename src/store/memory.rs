//! In-process counter store.
//!
//! Counters for all keys live in one `DashMap`; holding a key's entry guard
//! for the whole evaluation gives the per-key atomicity the algorithm
//! requires. Limits enforced by this store are per-process; use the Redis
//! store to share a quota across instances.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::config::RateLimitPolicy;

use super::window;
use super::{CounterState, CounterStore, Decision, StoreError};

/// A counter record plus the deadline after which it is treated as absent.
#[derive(Debug, Clone, Copy)]
struct Record {
    state: CounterState,
    expires_at: i64,
}

impl Record {
    fn live_state(&self, now: i64) -> Option<CounterState> {
        (now < self.expires_at).then_some(self.state)
    }
}

/// In-memory atomic counter store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of keys currently holding a record, expired or not.
    ///
    /// Primarily useful for tests and diagnostics.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait::async_trait]
impl CounterStore for MemoryStore {
    async fn evaluate(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: i64,
    ) -> Result<Decision, StoreError> {
        // The entry guard pins the key's map shard, so the whole
        // read/reset/compare/increment sequence below runs without another
        // call for this key interleaving.
        let decision = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get().live_state(now);
                let eval = window::evaluate(existing, policy, now);
                match eval.state {
                    Some(state) => {
                        occupied.insert(Record {
                            state,
                            expires_at: now + policy.record_ttl(),
                        });
                    }
                    // Rejected with an expired record left behind: drop it so
                    // the map does not accumulate dead keys it already read.
                    None if existing.is_none() => {
                        occupied.remove();
                    }
                    None => {}
                }
                eval.decision
            }
            Entry::Vacant(vacant) => {
                let eval = window::evaluate(None, policy, now);
                if let Some(state) = eval.state {
                    trace!(key = %key, "Creating counter record");
                    vacant.insert(Record {
                        state,
                        expires_at: now + policy.record_ttl(),
                    });
                }
                eval.decision
            }
        };

        if decision.limited {
            debug!(key = %key, "Rate limit exceeded");
        }

        Ok(decision)
    }
}
