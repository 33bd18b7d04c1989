//! The public cache façade.
//!
//! Composes the configured tiers, implements cascading reads with
//! promotion, write-through writes with per-tier failure isolation, and the
//! convenience operations built on top of them.

use futures_util::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use stratacache_core::{CacheConfig, CacheResult, CacheStats, DynTier, TierMode};
use stratacache_redis::RedisTier;

use crate::file::FileTier;
use crate::memory::MemoryTier;
use crate::stats::StatsRecorder;

/// Multi-tier cache façade.
///
/// ## Lookup order
///
/// ```text
/// get(key) → memory → redis → file → not found
///                ↓        ↓       ↓
///            no await  promote  promote (memory, and redis if configured)
/// ```
///
/// ## Write strategy
///
/// `set` always writes the memory tier and additionally every other
/// configured tier, independent of which single tier was nominally
/// selected, so "multi" truly keeps every backend warm. Per-tier failures
/// are caught and logged independently; a tier that already succeeded is
/// never rolled back.
///
/// Instances are constructed from an explicit [`CacheConfig`] and passed by
/// dependency injection; there are no module-level globals.
pub struct CacheOrchestrator {
    memory: Arc<MemoryTier>,
    remote: Option<DynTier>,
    file: Option<DynTier>,
    stats: Arc<StatsRecorder>,
    default_ttl: Duration,
    sweep_task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("remote", &self.remote.is_some())
            .field("file", &self.file.is_some())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CacheOrchestrator {
    /// Builds the configured tiers and starts the periodic memory sweep.
    ///
    /// Must be called inside a tokio runtime (the sweep task is spawned
    /// here and released by [`shutdown`](Self::shutdown)).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` when validation fails or a
    /// selected backend cannot be constructed. Runtime unavailability of a
    /// backend is not an error, here or later.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;

        let mut remote: Option<DynTier> = None;
        let mut file: Option<DynTier> = None;
        match config.tier {
            TierMode::Memory => {}
            TierMode::Redis => {
                if let Some(redis_config) = &config.redis {
                    remote = Some(Arc::new(RedisTier::connect(redis_config)?));
                }
            }
            TierMode::File => {
                if let Some(file_config) = &config.file {
                    file = Some(Arc::new(FileTier::create(file_config)?));
                }
            }
            TierMode::Multi => {
                if let Some(redis_config) = &config.redis {
                    remote = Some(Arc::new(RedisTier::connect(redis_config)?));
                }
                if let Some(file_config) = &config.file {
                    file = Some(Arc::new(FileTier::create(file_config)?));
                }
            }
        }

        let memory = Arc::new(MemoryTier::new(config.max_entries));
        let stats = Arc::new(StatsRecorder::new());
        let sweep_task = spawn_sweep(
            Arc::clone(&memory),
            Arc::clone(&stats),
            config.cleanup_interval(),
        );

        Ok(Self {
            memory,
            remote,
            file,
            stats,
            default_ttl: config.default_ttl(),
            sweep_task: Mutex::new(Some(sweep_task)),
        })
    }

    /// Cascading read.
    ///
    /// Memory first; then the remote tier, promoting a hit into memory with
    /// the default TTL; then the file tier, promoting a hit into memory and
    /// into the remote tier if configured. Promotion re-stamps the entry
    /// with the default TTL (refresh on access). Every call records exactly
    /// one hit or one miss.
    ///
    /// Returns `None` when every configured tier misses or when the cached
    /// value does not deserialize as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let start = Instant::now();

        if let Some(value) = self.memory.get(key) {
            tracing::debug!(key = %key, "cache hit (memory)");
            self.stats.record_hit(start);
            return decode(key, &value);
        }

        if let Some(remote) = &self.remote {
            if let Some(value) = remote.get(key).await {
                tracing::debug!(key = %key, tier = remote.name(), "cache hit");
                let value = Arc::new(value);
                self.promote_to_memory(key, &value);
                self.stats.record_hit(start);
                return decode(key, &value);
            }
        }

        if let Some(file) = &self.file {
            if let Some(value) = file.get(key).await {
                tracing::debug!(key = %key, tier = file.name(), "cache hit");
                let value = Arc::new(value);
                self.promote_to_memory(key, &value);
                if let Some(remote) = &self.remote {
                    remote.set(key, &value, self.default_ttl).await;
                }
                self.stats.record_hit(start);
                return decode(key, &value);
            }
        }

        tracing::debug!(key = %key, "cache miss");
        self.stats.record_miss(start);
        None
    }

    /// Write-through write.
    ///
    /// A zero or omitted TTL is clamped to the configured default. Returns
    /// `true` iff the memory-tier write succeeded; other tiers fail
    /// independently and only log.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => Arc::new(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize value for cache");
                return false;
            }
        };
        let ttl = self.effective_ttl(ttl);

        let evicted = self.memory.insert(key.to_string(), Arc::clone(&value), ttl);
        self.stats.record_evictions(evicted as u64);

        if let Some(remote) = &self.remote {
            remote.set(key, &value, ttl).await;
        }
        if let Some(file) = &self.file {
            file.set(key, &value, ttl).await;
        }
        true
    }

    /// Removes the key from every configured tier. Per-tier failures are
    /// independent and non-fatal. Returns whether the memory tier held the
    /// key.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.memory.remove(key);
        if let Some(remote) = &self.remote {
            remote.delete(key).await;
        }
        if let Some(file) = &self.file {
            file.delete(key).await;
        }
        removed
    }

    /// True if any configured tier reports presence. Does not imply
    /// freshness beyond the memory tier's own check, and records neither a
    /// hit nor a miss.
    pub async fn has(&self, key: &str) -> bool {
        if self.memory.contains(key) {
            return true;
        }
        if let Some(remote) = &self.remote {
            if remote.exists(key).await {
                return true;
            }
        }
        if let Some(file) = &self.file {
            if file.exists(key).await {
                return true;
            }
        }
        false
    }

    /// Concurrent [`get`](Self::get) per key, preserving input order.
    /// Not-found keys yield explicit `None` holes.
    pub async fn mget<T: DeserializeOwned>(&self, keys: &[&str]) -> Vec<Option<T>> {
        join_all(keys.iter().map(|key| self.get::<T>(key))).await
    }

    /// Concurrent [`set`](Self::set) per pair. Returns `false` only if a
    /// per-pair operation itself failed (tier-level errors are already
    /// swallowed internally), `true` otherwise.
    pub async fn mset<T: Serialize>(&self, pairs: &[(&str, T)], ttl: Option<Duration>) -> bool {
        let results = join_all(pairs.iter().map(|(key, value)| self.set(key, value, ttl))).await;
        results.into_iter().all(|ok| ok)
    }

    /// Read-then-write counter update; returns the new value. A previously
    /// absent key counts from zero.
    ///
    /// Not atomic across concurrent callers on the same key: the read and
    /// the write span a suspension point, so concurrent increments can lose
    /// updates. Callers needing exact counting must add external
    /// coordination.
    pub async fn increment(&self, key: &str, delta: i64) -> i64 {
        let current: i64 = self.get(key).await.unwrap_or(0);
        let next = current.saturating_add(delta);
        self.set(key, &next, None).await;
        next
    }

    /// On miss, invokes the asynchronous factory, stores its result and
    /// returns it.
    ///
    /// There is no single-flight de-duplication: concurrent callers racing
    /// on the same missing key may each invoke the factory. Callers needing
    /// compute-once semantics must add external coordination.
    pub async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        let value = factory().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Clears every configured tier and resets the counters.
    pub async fn clear(&self) {
        self.memory.clear();
        if let Some(remote) = &self.remote {
            remote.clear().await;
        }
        if let Some(file) = &self.file {
            file.clear().await;
        }
        self.stats.reset();
    }

    /// Immutable snapshot of the counters plus current memory-tier
    /// occupancy.
    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.memory.len(), self.memory.approx_bytes())
    }

    /// Current memory-tier entry count.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Whether the memory tier holds no entries.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Stops the sweep task and closes the remote tier connection if
    /// present. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.abort_sweep();
        if let Some(remote) = &self.remote {
            remote.close().await;
        }
    }

    fn promote_to_memory(&self, key: &str, value: &Arc<Value>) {
        let evicted = self
            .memory
            .insert(key.to_string(), Arc::clone(value), self.default_ttl);
        self.stats.record_evictions(evicted as u64);
    }

    fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        match ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => self.default_ttl,
        }
    }

    fn abort_sweep(&self) {
        let handle = self
            .sweep_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for CacheOrchestrator {
    fn drop(&mut self) {
        self.abort_sweep();
    }
}

fn spawn_sweep(
    memory: Arc<MemoryTier>,
    stats: Arc<StatsRecorder>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; skip the zeroth tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = memory.sweep_expired();
            if removed > 0 {
                tracing::debug!(removed, "memory sweep removed expired entries");
                stats.record_evictions(removed as u64);
            }
        }
    })
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cached value does not match requested type");
            None
        }
    }
}
