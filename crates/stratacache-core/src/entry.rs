//! The value envelope used by the memory tier.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached entry with TTL support.
///
/// The value is wrapped in `Arc` to allow cheap cloning on cache hits,
/// avoiding expensive copies of potentially large payloads. Stored values
/// are immutable snapshots; callers must not expect a cached copy to change
/// after mutating a value obtained from a hit.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// The stored value (canonical serialized form).
    pub value: Arc<Value>,
    /// When this entry was created.
    pub created_at: Instant,
    /// Maximum lifespan from creation before expiry. Always non-zero.
    pub ttl: Duration,
    /// Number of successful reads of this entry.
    pub access_count: u64,
    /// When this entry was last read (creation time until first read).
    pub last_accessed_at: Instant,
    /// Monotonic insertion sequence, used to break LRU ties.
    pub inserted_seq: u64,
    /// Serialized-length estimate of the value, not true memory footprint.
    pub approx_size_bytes: usize,
}

impl CacheEntry {
    /// Create a new entry. `ttl` must be non-zero; callers clamp beforehand.
    pub fn new(value: Arc<Value>, ttl: Duration, inserted_seq: u64) -> Self {
        let approx_size_bytes = approx_json_size(&value);
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_accessed_at: now,
            inserted_seq,
            approx_size_bytes,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Record a successful read.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Instant::now();
    }
}

/// Estimate the in-memory size of a JSON value by its serialized length.
///
/// A deliberate approximation: cheap, stable, and good enough for the
/// occupancy statistics it feeds.
pub fn approx_json_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entry_not_expired() {
        let entry = CacheEntry::new(Arc::new(json!("v")), Duration::from_secs(60), 0);
        assert!(!entry.is_expired());
        assert_eq!(entry.access_count, 0);
    }

    #[test]
    fn test_expiry_after_ttl_elapses() {
        let entry = CacheEntry::new(Arc::new(json!(1)), Duration::from_millis(10), 0);
        assert!(!entry.is_expired());
        std::thread::sleep(Duration::from_millis(30));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_touch_updates_access_tracking() {
        let mut entry = CacheEntry::new(Arc::new(json!("v")), Duration::from_secs(60), 0);
        let before = entry.last_accessed_at;
        std::thread::sleep(Duration::from_millis(2));
        entry.touch();
        assert_eq!(entry.access_count, 1);
        assert!(entry.last_accessed_at > before);
    }

    #[test]
    fn test_approx_size_tracks_serialized_length() {
        let small = CacheEntry::new(Arc::new(json!("a")), Duration::from_secs(1), 0);
        let large = CacheEntry::new(
            Arc::new(json!({"payload": "x".repeat(1024)})),
            Duration::from_secs(1),
            1,
        );
        assert!(large.approx_size_bytes > small.approx_size_bytes);
        assert_eq!(small.approx_size_bytes, "\"a\"".len());
    }
}
