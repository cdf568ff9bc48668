//! Time sources for window evaluation.
//!
//! The limiter captures `now` once per call, before the atomic store step, so
//! every backend evaluates the same instant. Windows are coarse-grained
//! (seconds or longer), so unix-second resolution is sufficient and minor
//! clock skew across processes is tolerated.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A source of the current time, in unix seconds.
pub trait Clock: Send + Sync {
    /// Current time as seconds since the unix epoch.
    fn now_unix(&self) -> i64;
}

/// Wall-clock time source used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A manually advanced clock for deterministic window-rollover tests.
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at the given unix timestamp.
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the clock to an absolute unix timestamp.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
