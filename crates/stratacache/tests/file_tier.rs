//! Integration tests for the file tier's blob format, filename index and
//! sweep behavior.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;

use stratacache::{CacheTier, FileConfig, FileTier};

fn tier_in(dir: &Path) -> FileTier {
    FileTier::create(&FileConfig {
        directory: dir.to_path_buf(),
    })
    .unwrap()
}

fn blob_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect()
}

#[tokio::test]
async fn set_then_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    let value = json!({"name": "widget", "tags": ["a", "b"]});
    tier.set("item", &value, Duration::from_secs(30)).await;

    assert_eq!(tier.get("item").await, Some(value));
    assert!(tier.exists("item").await);
    assert_eq!(tier.get("absent").await, None);
}

#[tokio::test]
async fn blob_is_sanitized_json_with_embedded_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("user:42/profile", &json!("v"), Duration::from_secs(30))
        .await;

    let files = blob_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("user_42_profile-"));

    let blob: Value = serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
    assert_eq!(blob["value"], json!("v"));
    assert!(blob["expiresAt"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn rewrite_supersedes_previous_generation() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("k", &json!(1), Duration::from_secs(30)).await;
    // Filenames are timestamp-suffixed per millisecond
    tokio::time::sleep(Duration::from_millis(5)).await;
    tier.set("k", &json!(2), Duration::from_secs(30)).await;

    assert_eq!(tier.get("k").await, Some(json!(2)));
    assert_eq!(blob_files(dir.path()).len(), 1);
}

#[tokio::test]
async fn expired_blob_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("short", &json!("v"), Duration::from_millis(20))
        .await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert_eq!(tier.get("short").await, None);
    assert!(!tier.exists("short").await);
}

#[tokio::test]
async fn delete_removes_blob_and_index_entry() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("k", &json!(1), Duration::from_secs(30)).await;
    tier.delete("k").await;

    assert_eq!(tier.get("k").await, None);
    assert!(blob_files(dir.path()).is_empty());

    // Deleting an absent key is a no-op
    tier.delete("k").await;
}

#[tokio::test]
async fn clear_removes_every_indexed_blob() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("a", &json!(1), Duration::from_secs(30)).await;
    tier.set("b", &json!(2), Duration::from_secs(30)).await;
    tier.clear().await;

    assert_eq!(tier.get("a").await, None);
    assert_eq!(tier.get("b").await, None);
    assert!(blob_files(dir.path()).is_empty());
}

#[tokio::test]
async fn sweep_deletes_only_expired_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("stale", &json!(1), Duration::from_millis(20)).await;
    tier.set("live", &json!(2), Duration::from_secs(30)).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    tier.sweep_expired().await;

    assert_eq!(blob_files(dir.path()).len(), 1);
    assert_eq!(tier.get("live").await, Some(json!(2)));
    assert_eq!(tier.get("stale").await, None);
}

#[tokio::test]
async fn index_is_not_rebuilt_after_restart() {
    let dir = tempfile::tempdir().unwrap();

    let tier = tier_in(dir.path());
    tier.set("k", &json!("persisted"), Duration::from_secs(30))
        .await;
    drop(tier);

    // A fresh tier over the same directory has an empty index; the old blob
    // is orphaned until a sweep reclaims it after expiry.
    let tier = tier_in(dir.path());
    assert_eq!(tier.get("k").await, None);
    assert_eq!(blob_files(dir.path()).len(), 1);
}

#[tokio::test]
async fn unreadable_blob_degrades_to_miss() {
    let dir = tempfile::tempdir().unwrap();
    let tier = tier_in(dir.path());

    tier.set("k", &json!(1), Duration::from_secs(30)).await;
    let files = blob_files(dir.path());
    std::fs::write(&files[0], b"not json").unwrap();

    assert_eq!(tier.get("k").await, None);
}
