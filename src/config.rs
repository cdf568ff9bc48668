//! Configuration for the Windgate limiter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WindgateError};

/// Policy applied to every key tracked by a limiter.
///
/// Created once at construction time and never mutated afterwards. A policy
/// with `max_hits = 0` is valid and rejects every call; a zero-length window
/// is not and is refused by [`RateLimitPolicy::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Length of one counting window, in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum number of admitted calls per window for a single key.
    #[serde(default = "default_max_hits")]
    pub max_hits: u32,

    /// Behavior when the counter store is unreachable: admit without
    /// counting (`true`) or surface the store error to the caller (`false`).
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_hits: default_max_hits(),
            fail_open: default_fail_open(),
        }
    }
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_hits() -> u32 {
    100
}

fn default_fail_open() -> bool {
    true
}

impl RateLimitPolicy {
    /// Create a policy from a window duration and quota.
    ///
    /// Sub-second durations are truncated; the window must be at least one
    /// second long to be valid.
    pub fn new(window: Duration, max_hits: u32) -> Self {
        Self {
            window_secs: window.as_secs(),
            max_hits,
            fail_open: default_fail_open(),
        }
    }

    /// Set the fail-open behavior.
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Load a policy from a YAML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let policy: RateLimitPolicy =
            serde_yaml::from_str(&contents).map_err(|e| WindgateError::Config(e.to_string()))?;
        Ok(policy)
    }

    /// Reject invalid configuration before any `limit` call is possible.
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(WindgateError::Config(
                "window duration must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Window length in seconds, as the signed type used for timestamps.
    pub(crate) fn window(&self) -> i64 {
        self.window_secs as i64
    }

    /// Time-to-live attached to persisted counter records.
    ///
    /// Doubled so a record written at the end of a window survives long
    /// enough to be read and rolled over by the next call, while idle keys
    /// still vanish without a sweep process.
    pub(crate) fn record_ttl(&self) -> i64 {
        self.window() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = RateLimitPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.window_secs, 60);
        assert_eq!(policy.max_hits, 100);
        assert!(policy.fail_open);
    }

    #[test]
    fn test_zero_window_rejected() {
        let policy = RateLimitPolicy::new(Duration::from_secs(0), 10);
        assert!(matches!(
            policy.validate(),
            Err(WindgateError::Config(_))
        ));
    }

    #[test]
    fn test_zero_quota_is_valid_configuration() {
        // Degenerate but legal: every call is rejected.
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 0);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_record_ttl_is_doubled_window() {
        let policy = RateLimitPolicy::new(Duration::from_secs(30), 5);
        assert_eq!(policy.record_ttl(), 60);
    }

    #[test]
    fn test_parse_from_yaml() {
        let yaml = "window_secs: 10\nmax_hits: 3\nfail_open: false\n";
        let policy: RateLimitPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.window_secs, 10);
        assert_eq!(policy.max_hits, 3);
        assert!(!policy.fail_open);
    }

    #[test]
    fn test_parse_applies_field_defaults() {
        let policy: RateLimitPolicy = serde_yaml::from_str("max_hits: 7\n").unwrap();
        assert_eq!(policy.window_secs, 60);
        assert_eq!(policy.max_hits, 7);
        assert!(policy.fail_open);
    }
}
