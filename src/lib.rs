//! Windgate - Fixed-Window Rate Limiting
//!
//! This crate gates how often an identity (client IP, API key, ...) may
//! perform an operation: a hard cap of N calls per fixed time window,
//! coordinated through a shared atomic counter store so the limit holds
//! across any number of concurrent processes. The whole window evaluation
//! runs as one indivisible step per key, so concurrent callers at the quota
//! boundary can never both be admitted.

pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod limiter;
pub mod store;

pub use config::RateLimitPolicy;
pub use error::{Result, WindgateError};
pub use hooks::Hooks;
pub use limiter::Limiter;
pub use store::{CounterStore, Decision, MemoryStore, StoreError};

#[cfg(feature = "redis")]
pub use store::{RedisStore, RedisStoreConfig};
