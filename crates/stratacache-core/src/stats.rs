//! Cache statistics snapshot type.

use serde::Serialize;

/// A point-in-time snapshot of cache statistics.
///
/// `hits`, `misses` and `evictions` are monotonic counters; `current_size`
/// and `approx_memory_bytes` reflect current memory-tier occupancy.
/// `approx_memory_bytes` is a serialized-length estimate, not a true memory
/// footprint. `average_access_time_ms` is computed over a bounded sliding
/// window of recent operations.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
    pub approx_memory_bytes: usize,
    pub average_access_time_ms: f64,
}

impl CacheStats {
    /// Calculate hit ratio.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = (self.hits + self.misses) as f64;
        if total == 0.0 {
            0.0
        } else {
            self.hits as f64 / total
        }
    }
}
