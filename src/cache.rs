//! Query result caching.
//!
//! The executor talks to a [`QueryCache`] capability so tests can inject a
//! fresh cache per run. Two backends ship with the crate: an in-memory TTL
//! cache for single-process runs and a JSON-file cache that survives
//! restarts.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{DiscoveryError, Result};
use crate::types::SearchResult;

/// Upper bound on distinct cached queries held in memory.
const MAX_CACHE_ENTRIES: u64 = 512;

/// Stable key for a query: SHA-256 over the trimmed, lowercased text.
/// Identical query text maps to the same key across runs and processes.
pub fn cache_key(query: &str) -> String {
    let normalized = query.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Storage capability for executed query results.
pub trait QueryCache: Send + Sync {
    /// Returns the cached results for a key, if present and fresh.
    fn get(&self, key: &str) -> impl Future<Output = Option<Vec<SearchResult>>> + Send;

    /// Stores results under a key.
    fn put(&self, key: &str, results: &[SearchResult]) -> impl Future<Output = ()> + Send;
}

/// In-memory TTL cache backed by `moka`.
pub struct MemoryCache {
    entries: Cache<String, Vec<SearchResult>>,
}

impl MemoryCache {
    /// Creates a cache whose entries expire after `ttl`. A zero TTL is
    /// clamped to one second; the executor skips caching entirely when
    /// caching is disabled.
    pub fn new(ttl: Duration) -> Self {
        let ttl = ttl.max(Duration::from_secs(1));
        let entries = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }
}

impl QueryCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        self.entries.get(key).await
    }

    async fn put(&self, key: &str, results: &[SearchResult]) {
        self.entries.insert(key.to_string(), results.to_vec()).await;
    }
}

/// One cached query on disk.
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    ttl_seconds: u64,
    results: Vec<SearchResult>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at).num_seconds();
        // Negative age means a clock jump; treat the entry as stale.
        age >= 0 && (age as u64) < self.ttl_seconds
    }
}

/// File-backed cache: one JSON file per key under a directory. Stale and
/// unreadable entries are removed lazily on read.
pub struct FileCache {
    dir: PathBuf,
    ttl_seconds: u64,
}

impl FileCache {
    /// Creates the cache directory if needed.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DiscoveryError::Cache(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            ttl_seconds: ttl.as_secs(),
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl QueryCache for FileCache {
    async fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        let path = self.entry_path(key);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("discarding unreadable cache entry {}: {e}", path.display());
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };
        if !entry.is_fresh(Utc::now()) {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.results)
    }

    async fn put(&self, key: &str, results: &[SearchResult]) {
        let entry = CacheEntry {
            stored_at: Utc::now(),
            ttl_seconds: self.ttl_seconds,
            results: results.to_vec(),
        };
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(self.entry_path(key), json).await {
                    warn!("failed to write cache entry for key {key}: {e}");
                }
            }
            Err(e) => warn!("failed to serialise cache entry for key {key}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> Vec<SearchResult> {
        vec![SearchResult::new(
            "DCSync detection",
            "https://example.com/dcsync",
            "Detecting DCSync attacks",
        )]
    }

    #[test]
    fn cache_key_is_stable_and_normalised() {
        let a = cache_key("  T1003.006 \"DCSync\"  ");
        let b = cache_key("t1003.006 \"dcsync\"");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, cache_key("t1003.006 dcsync"));
    }

    #[tokio::test]
    async fn memory_cache_round_trips() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let key = cache_key("dcsync detection");
        assert!(cache.get(&key).await.is_none());
        cache.put(&key, &sample_results()).await;
        let cached = cache.get(&key).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].url, "https://example.com/dcsync");
    }

    fn temp_cache_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("recon-search-test-{label}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn file_cache_round_trips() {
        let dir = temp_cache_dir("roundtrip");
        let cache = FileCache::new(&dir, Duration::from_secs(60)).unwrap();
        let key = cache_key("dcsync detection");
        assert!(cache.get(&key).await.is_none());
        cache.put(&key, &sample_results()).await;
        let cached = cache.get(&key).await.unwrap();
        assert_eq!(cached[0].title, "DCSync detection");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn file_cache_expires_entries() {
        let dir = temp_cache_dir("expiry");
        let cache = FileCache::new(&dir, Duration::ZERO).unwrap();
        let key = cache_key("dcsync detection");
        cache.put(&key, &sample_results()).await;
        assert!(cache.get(&key).await.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn file_cache_discards_corrupt_entries() {
        let dir = temp_cache_dir("corrupt");
        let cache = FileCache::new(&dir, Duration::from_secs(60)).unwrap();
        let key = cache_key("dcsync detection");
        std::fs::write(dir.join(format!("{key}.json")), "not json").unwrap();
        assert!(cache.get(&key).await.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
