//! # stratacache-redis
//!
//! Redis remote tier for the stratacache engine.
//!
//! Values are serialized as JSON strings and stored under the cache key with
//! native expiry set to `ceil(ttl_ms / 1000)` seconds. Connectivity failures
//! are caught at this boundary and reported as a tier miss/no-op - never
//! propagated as a fatal error - so losing the Redis backend degrades the
//! cache, it does not crash the caller.

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;

use stratacache_core::{CacheError, CacheResult, CacheTier, RedisConfig};

/// Shared, distributed secondary tier backed by Redis.
///
/// One pool is shared per cache instance; per-call failures are isolated and
/// never corrupt shared connection state.
#[derive(Debug)]
pub struct RedisTier {
    pool: Pool,
    key_prefix: String,
}

impl RedisTier {
    /// Builds the connection pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` for an invalid URL or pool
    /// configuration. Runtime unavailability of the backend is not checked
    /// here and never surfaces as an error later.
    pub fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let pool = deadpool_redis::Config::from_url(&config.url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                CacheError::configuration(format!("invalid redis configuration: {e}"))
            })?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone().unwrap_or_default(),
        })
    }

    /// Check backend reachability (for health checks).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::TierUnavailable` when no connection can be
    /// obtained. Cache operations never surface this themselves.
    pub async fn ping(&self) -> CacheResult<()> {
        match self.pool.get().await {
            Ok(_) => Ok(()),
            Err(e) => Err(CacheError::tier_unavailable("redis", e.to_string())),
        }
    }

    /// Check if the backend is reachable.
    pub async fn is_available(&self) -> bool {
        self.ping().await.is_ok()
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn conn(&self) -> Option<deadpool_redis::Connection> {
        match self.pool.get().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get Redis connection");
                None
            }
        }
    }
}

/// Native expiry in whole seconds, rounded up.
fn ttl_to_secs(ttl: Duration) -> u64 {
    ttl.as_millis().div_ceil(1000) as u64
}

#[async_trait]
impl CacheTier for RedisTier {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let key = self.prefixed(key);
        let mut conn = self.conn().await?;
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Undecodable Redis payload");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET error");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        let key = self.prefixed(key);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize value for Redis");
                return;
            }
        };
        let Some(mut conn) = self.conn().await else {
            return;
        };
        let ttl_secs = ttl_to_secs(ttl);
        if let Err(e) = conn.set_ex::<_, _, ()>(&key, json, ttl_secs).await {
            tracing::warn!(key = %key, error = %e, "Redis SET error");
        } else {
            tracing::debug!(key = %key, ttl_secs = %ttl_secs, "cache set (redis)");
        }
    }

    async fn delete(&self, key: &str) {
        let key = self.prefixed(key);
        let Some(mut conn) = self.conn().await else {
            return;
        };
        if let Err(e) = conn.del::<_, ()>(&key).await {
            tracing::warn!(key = %key, error = %e, "Redis DEL error");
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let key = self.prefixed(key);
        let Some(mut conn) = self.conn().await else {
            return false;
        };
        match conn.exists::<_, bool>(&key).await {
            Ok(present) => present,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis EXISTS error");
                false
            }
        }
    }

    async fn clear(&self) {
        let Some(mut conn) = self.conn().await else {
            return;
        };
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = match redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, "Redis SCAN error during clear");
                    return;
                }
            };
            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(keys).await {
                    tracing::warn!(error = %e, "Redis DEL error during clear");
                    return;
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
    }

    async fn close(&self) {
        // Idempotent; pending calls fail and are degraded like any outage.
        self.pool.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_to_secs(Duration::from_millis(1)), 1);
        assert_eq!(ttl_to_secs(Duration::from_millis(999)), 1);
        assert_eq!(ttl_to_secs(Duration::from_millis(1000)), 1);
        assert_eq!(ttl_to_secs(Duration::from_millis(1001)), 2);
        assert_eq!(ttl_to_secs(Duration::from_secs(300)), 300);
    }

    #[test]
    fn test_key_prefixing() {
        let tier = RedisTier::connect(&RedisConfig {
            url: "redis://127.0.0.1:6379".into(),
            key_prefix: Some("app:cache:".into()),
        })
        .unwrap();
        assert_eq!(tier.prefixed("user:42"), "app:cache:user:42");

        let tier = RedisTier::connect(&RedisConfig {
            url: "redis://127.0.0.1:6379".into(),
            key_prefix: None,
        })
        .unwrap();
        assert_eq!(tier.prefixed("user:42"), "user:42");
    }

    #[test]
    fn test_invalid_url_fails_fast() {
        let result = RedisTier::connect(&RedisConfig {
            url: "not a url".into(),
            key_prefix: None,
        });
        assert!(result.is_err());
        assert!(result.unwrap_err().is_configuration());
    }
}
