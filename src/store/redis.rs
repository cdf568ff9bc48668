//! Redis-backed counter store.
//!
//! The whole fixed-window evaluation runs as a server-side Lua script, so the
//! read, the rollover check, the quota comparison, and the increment happen
//! in one round trip with no other client interleaving. Counter records are
//! written with an `EX` expiry of twice the window, letting idle keys vanish
//! without a sweep process.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::info;

use crate::config::RateLimitPolicy;

use super::{CounterStore, Decision, StoreError};

/// Mirrors `store::window::evaluate`; keep the two in sync.
///
/// Returns `{limited, remaining, reset}` where `remaining` may be negative
/// on rejection and is clamped client-side.
const EVALUATE_SCRIPT: &str = r#"
local tsKey   = KEYS[1]
local hitsKey = KEYS[2]
local window  = tonumber(ARGV[1])
local limit   = tonumber(ARGV[2])
local now     = tonumber(ARGV[3])

local ts   = tonumber(redis.call("GET", tsKey) or now)
local hits = tonumber(redis.call("GET", hitsKey) or 0)

if ts + window < now then
    ts   = now
    hits = 0
end

if hits >= limit then
    return {1, limit - hits, ts + window}
else
    hits = hits + 1
    redis.call("SET", tsKey, ts, "EX", window * 2)
    redis.call("SET", hitsKey, hits, "EX", window * 2)
    return {0, limit - hits, ts + window}
end
"#;

/// Configuration for the Redis counter store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    pub url: String,
    /// Deadline for establishing the initial connection.
    pub connect_timeout: Duration,
    /// Per-call deadline for the evaluation round trip.
    pub command_timeout: Duration,
    /// Prefix namespacing counter records in a shared instance.
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(1),
            key_prefix: "windgate".to_string(),
        }
    }
}

/// Counter store backed by a shared Redis instance.
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
    script: Script,
}

impl RedisStore {
    /// Connect to Redis and prepare the evaluation script.
    pub async fn new(config: RedisStoreConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Backend(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        info!(url = %config.url, "Connected to Redis counter store");

        Ok(Self {
            conn,
            config,
            script: Script::new(EVALUATE_SCRIPT),
        })
    }

    fn record_keys(&self, key: &str) -> (String, String) {
        let base = format!("{}:{}", self.config.key_prefix, key);
        (format!("{base}:ts"), format!("{base}:hits"))
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn evaluate(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: i64,
    ) -> Result<Decision, StoreError> {
        let (ts_key, hits_key) = self.record_keys(key);
        let mut conn = self.conn.clone();

        let mut invocation = self.script.prepare_invoke();
        invocation
            .key(&ts_key)
            .key(&hits_key)
            .arg(policy.window())
            .arg(policy.max_hits)
            .arg(now);

        let reply: Vec<i64> =
            tokio::time::timeout(self.config.command_timeout, invocation.invoke_async(&mut conn))
                .await
                .map_err(|_| StoreError::Timeout)?
                .map_err(|e| StoreError::Backend(e.to_string()))?;

        let [limited, remaining, reset] = reply[..] else {
            return Err(StoreError::MalformedResponse(format!(
                "expected 3 integers, got {} values",
                reply.len()
            )));
        };

        Ok(Decision::new(
            policy.max_hits,
            remaining.max(0) as u32,
            reset,
            limited == 1,
        ))
    }
}
