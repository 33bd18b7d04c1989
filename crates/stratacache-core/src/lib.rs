//! # stratacache-core
//!
//! Abstraction layer for the stratacache multi-tier caching engine.
//!
//! This crate defines the types shared by every tier backend and by the
//! orchestrator. It does not contain tier implementations - those are
//! provided by separate crates.
//!
//! ## Overview
//!
//! The main trait is [`CacheTier`], which defines the contract secondary
//! backends (Redis, file directory) implement:
//! - key/value reads and writes with per-entry TTL
//! - presence checks and deletion
//! - failure isolation: infrastructure errors degrade to miss/no-op at the
//!   tier boundary instead of propagating to callers
//!
//! ## Example
//!
//! ```ignore
//! use stratacache_core::{CacheConfig, TierMode};
//!
//! let config: CacheConfig = serde_json::from_str(
//!     r#"{ "tier": "redis", "redis": { "url": "redis://127.0.0.1:6379" } }"#,
//! )?;
//! config.validate()?;
//! ```

mod config;
mod entry;
mod error;
mod stats;
mod tier;

// Re-export everything from submodules
pub use config::{CacheConfig, FileConfig, RedisConfig, TierMode};
pub use entry::{CacheEntry, approx_json_size};
pub use error::{CacheError, CacheResult, ErrorCategory};
pub use stats::CacheStats;
pub use tier::{CacheTier, DynTier};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use stratacache_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{CacheConfig, FileConfig, RedisConfig, TierMode};
    pub use crate::entry::{CacheEntry, approx_json_size};
    pub use crate::error::{CacheError, CacheResult, ErrorCategory};
    pub use crate::stats::CacheStats;
    pub use crate::tier::{CacheTier, DynTier};
}
