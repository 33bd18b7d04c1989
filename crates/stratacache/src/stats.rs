//! Cross-cutting cache counters and access-latency tracking.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use stratacache_core::CacheStats;

/// Fixed capacity of the rolling latency window.
const LATENCY_WINDOW: usize = 1000;

/// Hit/miss/eviction counters plus a bounded rolling average of
/// per-operation latency.
///
/// `evictions` counts both capacity evictions and sweep removals.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    latencies_ms: Mutex<VecDeque<f64>>,
}

impl StatsRecorder {
    /// Create a recorder with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit and the elapsed time of the operation that produced it.
    pub fn record_hit(&self, start: Instant) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.record_latency(start);
    }

    /// Record a miss and the elapsed time of the operation that produced it.
    pub fn record_miss(&self, start: Instant) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.record_latency(start);
    }

    /// Record entries removed by capacity eviction or expiry sweep.
    pub fn record_evictions(&self, count: u64) {
        if count > 0 {
            self.evictions.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Mean latency over the retained window, in milliseconds.
    pub fn average_access_time_ms(&self) -> f64 {
        let window = self
            .latencies_ms
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        }
    }

    /// Immutable snapshot combining the counters with the supplied
    /// memory-tier occupancy figures.
    pub fn snapshot(&self, current_size: usize, approx_memory_bytes: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            current_size,
            approx_memory_bytes,
            average_access_time_ms: self.average_access_time_ms(),
        }
    }

    /// Zero every counter and drop the latency window.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.latencies_ms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn record_latency(&self, start: Instant) {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut window = self
            .latencies_ms
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if window.len() == LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(elapsed_ms);
    }
}
