//! Cache configuration.
//!
//! Instances are constructed explicitly and passed by dependency injection;
//! there are no module-level singletons, so independently configured named
//! caches (general, AI-response, distributed, persistent) can coexist in one
//! process with isolated lifecycles.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which tiers an orchestrator composes.
///
/// The memory tier is always present; the selector adds backends behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierMode {
    /// Memory only.
    Memory,
    /// Memory + Redis.
    Redis,
    /// Memory + file directory.
    File,
    /// Memory + every backend with a config section present.
    Multi,
}

/// Connection parameters for the Redis tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: String,

    /// Prefix prepended to every key, so independent cache instances can
    /// share one Redis without colliding.
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// Settings for the file tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Directory holding one blob file per key-generation.
    pub directory: PathBuf,
}

/// Configuration for one cache instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Tier selector.
    #[serde(default = "default_tier")]
    pub tier: TierMode,

    /// Memory tier capacity in entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// TTL applied when a caller omits one (ms).
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Memory-sweep period (ms).
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Redis tier settings; required for `tier = redis`.
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// File tier settings; required for `tier = file`.
    #[serde(default)]
    pub file: Option<FileConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tier: default_tier(),
            max_entries: default_max_entries(),
            default_ttl_ms: default_ttl_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            redis: None,
            file: None,
        }
    }
}

impl CacheConfig {
    /// Validates the configuration, failing fast on a selected tier that
    /// lacks required parameters.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_entries == 0 {
            return Err(CacheError::configuration("max_entries must be > 0"));
        }
        if self.default_ttl_ms == 0 {
            return Err(CacheError::configuration("default_ttl_ms must be > 0"));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(CacheError::configuration(
                "cleanup_interval_ms must be > 0",
            ));
        }
        match self.tier {
            TierMode::Memory => {}
            TierMode::Redis => {
                if self.redis.is_none() {
                    return Err(CacheError::configuration(
                        "tier 'redis' selected but [redis] section is missing",
                    ));
                }
            }
            TierMode::File => {
                if self.file.is_none() {
                    return Err(CacheError::configuration(
                        "tier 'file' selected but [file] section is missing",
                    ));
                }
            }
            TierMode::Multi => {
                if self.redis.is_none() && self.file.is_none() {
                    return Err(CacheError::configuration(
                        "tier 'multi' selected but neither [redis] nor [file] is configured",
                    ));
                }
            }
        }
        if let Some(redis) = &self.redis {
            if redis.url.trim().is_empty() {
                return Err(CacheError::configuration("redis.url must not be empty"));
            }
        }
        if let Some(file) = &self.file {
            if file.directory.as_os_str().is_empty() {
                return Err(CacheError::configuration(
                    "file.directory must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Default TTL as a duration.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Memory-sweep period as a duration.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

fn default_tier() -> TierMode {
    TierMode::Memory
}

fn default_max_entries() -> usize {
    10_000
}

fn default_ttl_ms() -> u64 {
    300_000
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}
