//! The tier trait every cache backend implements.
//!
//! A tier is one backing store (remote key-value service, blob directory)
//! participating in the cache behind the orchestrator's memory map.
//! Implementations must be thread-safe (`Send + Sync`) and must catch their
//! own infrastructure failures: a failed read is reported as a miss and a
//! failed write as a no-op, so losing a backend degrades the cache instead
//! of crashing the caller.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Contract for a secondary cache tier.
///
/// # Example
///
/// ```ignore
/// use stratacache_core::{CacheTier, DynTier};
///
/// async fn warm(tier: &DynTier, key: &str, value: &serde_json::Value) {
///     tier.set(key, value, std::time::Duration::from_secs(300)).await;
/// }
/// ```
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Short tier name used in structured log fields ("redis", "file").
    fn name(&self) -> &'static str;

    /// Reads a value by key.
    ///
    /// Returns `None` for absent keys, expired entries, and infrastructure
    /// failures alike; failures are logged at the tier boundary.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Writes a value with the given TTL.
    ///
    /// Infrastructure and serialization failures are logged and swallowed;
    /// the write becomes a no-op for this tier only.
    async fn set(&self, key: &str, value: &Value, ttl: Duration);

    /// Removes a key. No-op when absent or on failure.
    async fn delete(&self, key: &str);

    /// Checks presence. Does not imply freshness beyond what the backend's
    /// own expiry enforces.
    async fn exists(&self, key: &str) -> bool;

    /// Removes every entry owned by this tier.
    async fn clear(&self);

    /// Releases backend resources. Safe to call more than once.
    async fn close(&self) {}
}

/// Type alias for a shared tier trait object.
pub type DynTier = std::sync::Arc<dyn CacheTier>;
