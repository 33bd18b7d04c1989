//! Disk-backed blob tier.
//!
//! Each key maps to one blob file containing `{"value": ..., "expiresAt": ...}`;
//! TTL is embedded in the payload because the backing store has no native
//! expiry. Blobs survive process restarts for the lifetime of their files,
//! but the key-to-filename index lives only in memory: blobs written by a
//! previous process are orphaned until their embedded expiry passes and a
//! sweep reclaims them.
//!
//! Cleanup is amortized across writes: each write has a 1-in-100 chance of
//! triggering a directory sweep that deletes every expired blob, instead of
//! running a dedicated timer.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;

use stratacache_core::{CacheError, CacheResult, CacheTier, FileConfig};

/// Probability (1/N) of running a directory sweep on write.
const SWEEP_PROBABILITY: u32 = 100; // 1% chance

/// On-disk blob format: the serialized value plus its absolute expiry.
#[derive(Debug, Serialize, Deserialize)]
struct FileBlob {
    value: Value,
    #[serde(rename = "expiresAt")]
    expires_at: i64,
}

/// Durable tertiary tier storing one JSON blob per key-generation.
///
/// Filenames are timestamp-suffixed and superseded on rewrite, so a live
/// key-to-current-filename index is required to find the current blob.
pub struct FileTier {
    directory: PathBuf,
    index: DashMap<String, PathBuf>,
}

impl FileTier {
    /// Creates the blob directory and an empty index.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Configuration` when the directory cannot be
    /// created; later I/O failures are logged and degraded instead.
    pub fn create(config: &FileConfig) -> CacheResult<Self> {
        std::fs::create_dir_all(&config.directory).map_err(|e| {
            CacheError::configuration(format!(
                "cannot create cache directory {}: {e}",
                config.directory.display()
            ))
        })?;
        Ok(Self {
            directory: config.directory.clone(),
            index: DashMap::new(),
        })
    }

    /// Delete every blob in the directory whose embedded expiry has passed.
    pub async fn sweep_expired(&self) {
        let mut dir = match tokio::fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cache directory for sweep");
                return;
            }
        };

        let now = now_epoch_ms();
        let mut deleted: HashSet<PathBuf> = HashSet::new();
        while let Ok(Some(dirent)) = dir.next_entry().await {
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_blob(&path).await {
                Some(blob) if blob.expires_at <= now => {
                    if tokio::fs::remove_file(&path).await.is_ok() {
                        deleted.insert(path);
                    }
                }
                Some(_) => {}
                // Unreadable blobs are left alone; a later rewrite supersedes them
                None => {}
            }
        }

        if !deleted.is_empty() {
            tracing::debug!(count = deleted.len(), "swept expired cache blobs");
            self.index.retain(|_, path| !deleted.contains(path));
        }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}-{}.json", sanitize_key(key), now_epoch_ms()))
    }
}

#[async_trait]
impl CacheTier for FileTier {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let path = self.index.get(key).map(|p| p.value().clone())?;
        let blob = match read_blob(&path).await {
            Some(blob) => blob,
            None => {
                self.index.remove(key);
                return None;
            }
        };
        if now_epoch_ms() >= blob.expires_at {
            self.index.remove(key);
            // Schedule deletion; the read path stays non-blocking on cleanup
            tokio::spawn(async move {
                let _ = tokio::fs::remove_file(&path).await;
            });
            return None;
        }
        Some(blob.value)
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        let blob = FileBlob {
            value: value.clone(),
            expires_at: now_epoch_ms().saturating_add(ttl.as_millis() as i64),
        };
        let bytes = match serde_json::to_vec(&blob) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize cache blob");
                return;
            }
        };

        let path = self.blob_path(key);
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            tracing::warn!(key = %key, error = %e, "Failed to write cache blob");
            return;
        }
        tracing::debug!(key = %key, path = %path.display(), "cache set (file)");

        // Superseded generation is best-effort deleted
        if let Some(old) = self.index.insert(key.to_string(), path.clone()) {
            if old != path {
                let _ = tokio::fs::remove_file(&old).await;
            }
        }

        if fastrand::u32(0..SWEEP_PROBABILITY) == 0 {
            self.sweep_expired().await;
        }
    }

    async fn delete(&self, key: &str) {
        if let Some((_, path)) = self.index.remove(key) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete cache blob");
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear(&self) {
        let paths: Vec<PathBuf> = self.index.iter().map(|e| e.value().clone()).collect();
        self.index.clear();
        for path in paths {
            let _ = tokio::fs::remove_file(&path).await;
        }
    }
}

/// Map any character outside `[A-Za-z0-9._-]` to `_` so arbitrary cache keys
/// become safe filename stems.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn now_epoch_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

async fn read_blob(path: &Path) -> Option<FileBlob> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read cache blob");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(blob) => Some(blob),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Undecodable cache blob");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("user:42/profile"), "user_42_profile");
        assert_eq!(sanitize_key("plain-key.v1"), "plain-key.v1");
        assert_eq!(sanitize_key("ключ"), "____");
    }

    #[test]
    fn test_blob_format_matches_wire_shape() {
        let blob = FileBlob {
            value: serde_json::json!({"n": 1}),
            expires_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&blob).unwrap();
        assert_eq!(json["expiresAt"], 1_700_000_000_000i64);
        assert_eq!(json["value"]["n"], 1);
    }
}
