//! In-process memory tier with LRU eviction and TTL expiry.
//!
//! The authoritative, fastest tier. Operations execute without suspension
//! and are therefore implicitly serialized with respect to each other under
//! a cooperative scheduler; the map itself is safe for concurrent use.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use stratacache_core::CacheEntry;

/// In-memory map with LRU eviction and TTL expiry.
///
/// Eviction scans the full map for the entry with the globally minimal
/// `last_accessed_at` (ties broken by insertion order). O(n) per eviction,
/// amortized over the capacity of the map.
pub struct MemoryTier {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
    insert_seq: AtomicU64,
}

impl MemoryTier {
    /// Create a memory tier holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(max_entries.min(1024)),
            max_entries,
            insert_seq: AtomicU64::new(0),
        }
    }

    /// Look up a key.
    ///
    /// Absent keys miss. Present-but-expired entries are removed and miss.
    /// Hits bump `access_count`/`last_accessed_at` and return a cheap
    /// `Arc` clone of the stored value.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired() {
                // Release the shard lock before removing
                drop(entry);
                self.entries.remove(key);
                return None;
            }
            entry.touch();
            return Some(Arc::clone(&entry.value));
        }
        None
    }

    /// Insert a value, evicting exactly one LRU entry first when the map is
    /// at capacity and the key is new. Returns the number of evicted entries.
    pub fn insert(&self, key: String, value: Arc<Value>, ttl: Duration) -> usize {
        let mut evicted = 0;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(victim) = self.lru_victim() {
                self.entries.remove(&victim);
                tracing::debug!(key = %victim, "evicted LRU entry");
                evicted += 1;
            }
        }
        let seq = self.insert_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key, CacheEntry::new(value, ttl, seq));
        evicted
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Freshness-checked presence test. Expired entries are removed and
    /// reported absent.
    pub fn contains(&self, key: &str) -> bool {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return false;
            }
            return true;
        }
        false
    }

    /// Remove every entry whose TTL has elapsed. Returns how many were
    /// removed.
    pub fn sweep_expired(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if self.entries.remove_if(&key, |_, e| e.is_expired()).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tier holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of each entry's serialized-length size estimate.
    pub fn approx_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.approx_size_bytes)
            .sum()
    }

    /// Key of the least-recently-accessed entry, insertion order breaking
    /// ties.
    fn lru_victim(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|entry| (entry.last_accessed_at, entry.inserted_seq))
            .map(|entry| entry.key().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: impl serde::Serialize) -> Arc<Value> {
        Arc::new(serde_json::to_value(v).unwrap())
    }

    #[test]
    fn test_set_then_get() {
        let tier = MemoryTier::new(10);
        tier.insert("a".into(), value("hello"), Duration::from_secs(60));
        assert_eq!(tier.get("a").as_deref(), Some(&json!("hello")));
        assert_eq!(tier.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let tier = MemoryTier::new(10);
        tier.insert("a".into(), value(1), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(tier.get("a"), None);
        // Lazy expiry removed the entry from occupancy too
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_accessed() {
        let tier = MemoryTier::new(2);
        tier.insert("a".into(), value(1), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        tier.insert("b".into(), value(2), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));

        // Touch "a" so "b" becomes the LRU entry
        assert!(tier.get("a").is_some());
        std::thread::sleep(Duration::from_millis(5));

        let evicted = tier.insert("c".into(), value(3), Duration::from_secs(60));
        assert_eq!(evicted, 1);
        assert_eq!(tier.len(), 2);
        assert!(tier.get("a").is_some());
        assert!(tier.get("b").is_none());
        assert!(tier.get("c").is_some());
    }

    #[test]
    fn test_eviction_tie_broken_by_insertion_order() {
        let tier = MemoryTier::new(2);
        // Neither entry is ever read, so last_accessed_at keeps creation
        // order and the older insertion loses.
        tier.insert("first".into(), value(1), Duration::from_secs(60));
        tier.insert("second".into(), value(2), Duration::from_secs(60));
        tier.insert("third".into(), value(3), Duration::from_secs(60));

        assert!(tier.get("first").is_none());
        assert!(tier.get("second").is_some());
        assert!(tier.get("third").is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let tier = MemoryTier::new(2);
        tier.insert("a".into(), value(1), Duration::from_secs(60));
        tier.insert("b".into(), value(2), Duration::from_secs(60));
        let evicted = tier.insert("a".into(), value(10), Duration::from_secs(60));
        assert_eq!(evicted, 0);
        assert_eq!(tier.len(), 2);
        assert_eq!(tier.get("a").as_deref(), Some(&json!(10)));
    }

    #[test]
    fn test_remove() {
        let tier = MemoryTier::new(10);
        tier.insert("a".into(), value(1), Duration::from_secs(60));
        assert!(tier.remove("a"));
        assert!(!tier.remove("a"));
        assert_eq!(tier.get("a"), None);
    }

    #[test]
    fn test_contains_checks_freshness() {
        let tier = MemoryTier::new(10);
        tier.insert("live".into(), value(1), Duration::from_secs(60));
        tier.insert("stale".into(), value(2), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        assert!(tier.contains("live"));
        assert!(!tier.contains("stale"));
        assert!(!tier.contains("absent"));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_sweep_expired() {
        let tier = MemoryTier::new(10);
        tier.insert("a".into(), value(1), Duration::from_millis(10));
        tier.insert("b".into(), value(2), Duration::from_millis(10));
        tier.insert("c".into(), value(3), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(tier.sweep_expired(), 2);
        assert_eq!(tier.len(), 1);
        assert!(tier.get("c").is_some());
    }

    #[test]
    fn test_approx_bytes_follows_occupancy() {
        let tier = MemoryTier::new(10);
        assert_eq!(tier.approx_bytes(), 0);
        tier.insert("a".into(), value("x".repeat(100)), Duration::from_secs(60));
        let with_one = tier.approx_bytes();
        assert!(with_one >= 100);
        tier.remove("a");
        assert_eq!(tier.approx_bytes(), 0);
    }

    #[test]
    fn test_clear() {
        let tier = MemoryTier::new(10);
        tier.insert("a".into(), value(1), Duration::from_secs(60));
        tier.insert("b".into(), value(2), Duration::from_secs(60));
        tier.clear();
        assert!(tier.is_empty());
    }
}
