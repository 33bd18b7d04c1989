//! # stratacache
//!
//! Multi-tier look-aside caching engine.
//!
//! ## Architecture
//!
//! - **Memory tier (DashMap)**: in-process, suspension-free, LRU + TTL
//! - **Redis tier**: network, shared across instances, native expiry
//! - **File tier**: disk blobs, survives restarts, expiry embedded in payload
//!
//! ## Cache hierarchy
//!
//! ```text
//! get(key) → memory → redis → file → not found
//!               ↓        ↓       ↓
//!            <1µs     ~ms     disk I/O
//! ```
//!
//! Hits in a slower tier are promoted into the faster tiers; writes go
//! through every configured tier.
//!
//! ## Graceful degradation
//!
//! Losing the Redis or file backend degrades reads to misses and writes to
//! no-ops for that tier only; callers never see the outage.
//!
//! ## Example
//!
//! ```ignore
//! use stratacache::{CacheConfig, CacheOrchestrator, TierMode};
//!
//! let cache = CacheOrchestrator::new(CacheConfig::default())?;
//! cache.set("greeting", &"hello", None).await;
//! let hit: Option<String> = cache.get("greeting").await;
//! cache.shutdown().await;
//! ```

pub mod file;
pub mod memory;
pub mod orchestrator;
pub mod stats;

pub use file::FileTier;
pub use memory::MemoryTier;
pub use orchestrator::CacheOrchestrator;
pub use stats::StatsRecorder;

// Re-export the shared types and the remote tier so callers depend on one crate.
pub use stratacache_core::{
    CacheConfig, CacheEntry, CacheError, CacheResult, CacheStats, CacheTier, DynTier, FileConfig,
    RedisConfig, TierMode,
};
pub use stratacache_redis::RedisTier;
