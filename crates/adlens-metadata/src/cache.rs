//! Key-value cache for API responses with a freshness window.
//!
//! Keys are namespaced (`video:ID`, `channel:ID`, `categories:REGION`).
//! Each value is stored as `{ "data": ..., "_fetched_at": <unix seconds> }`.
//! Stale entries are refetched and overwritten, never evicted.
//!
//! The file backend rewrites the whole file through a temporary file and a
//! rename. It does not lock across processes; concurrent writers may lose
//! each other's updates.

use crate::error::{MetadataError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default freshness window: 24 hours.
pub const DEFAULT_TTL_SECONDS: f64 = 86_400.0;

pub fn video_key(video_id: &str) -> String {
    format!("video:{}", video_id)
}

pub fn channel_key(channel_id: &str) -> String {
    format!("channel:{}", channel_id)
}

pub fn categories_key(region: &str) -> String {
    format!("categories:{}", region)
}

/// One cached value and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Unix seconds; a missing timestamp reads as 0 and is always stale.
    #[serde(rename = "_fetched_at", default)]
    pub fetched_at: f64,
}

/// Storage for cache entries.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;
    fn put(&self, key: &str, entry: CacheEntry) -> Result<()>;
}

/// Source of the current time in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

/// Entries younger than `ttl_seconds` are fresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TtlPolicy {
    pub ttl_seconds: f64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl TtlPolicy {
    pub fn is_fresh(&self, entry: &CacheEntry, now: f64) -> bool {
        now - entry.fetched_at < self.ttl_seconds
    }
}

/// In-process backend, used in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }
}

/// A single JSON file holding every entry.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    // Serializes read-modify-write within this process only
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file is an empty cache.
    fn load(&self) -> BTreeMap<String, CacheEntry> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Ignoring unreadable cache file {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }
}

impl CacheBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.load().remove(key))
    }

    fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load();
        entries.insert(key.to_string(), entry);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            MetadataError::Cache(format!(
                "could not replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

/// Backend plus freshness policy.
pub struct MetadataCache {
    backend: Box<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    policy: TtlPolicy,
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl MetadataCache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            clock: Arc::new(SystemClock),
            policy: TtlPolicy::default(),
        }
    }

    /// File-backed cache at `path` with the default policy.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: TtlPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The cached value for `key` if present and fresh.
    pub fn get_fresh(&self, key: &str) -> Result<Option<Value>> {
        let Some(entry) = self.backend.get(key)? else {
            return Ok(None);
        };
        if self.policy.is_fresh(&entry, self.clock.now()) {
            debug!("Cache hit for {}", key);
            Ok(Some(entry.data))
        } else {
            debug!("Cache entry for {} is stale", key);
            Ok(None)
        }
    }

    /// Store `data` under `key`, stamped with the current time.
    pub fn store(&self, key: &str, data: Value) -> Result<()> {
        self.backend.put(
            key,
            CacheEntry {
                data,
                fetched_at: self.clock.now(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::tempdir;

    struct ManualClock(AtomicU64);

    impl Clock for ManualClock {
        fn now(&self) -> f64 {
            self.0.load(Ordering::SeqCst) as f64
        }
    }

    #[test]
    fn test_freshness_window() {
        let clock = Arc::new(ManualClock(AtomicU64::new(1_000)));
        let cache = MetadataCache::in_memory().with_clock(clock.clone());

        cache.store("video:abc", json!({"viewCount": 5})).unwrap();
        clock.0.store(1_000 + 86_399, Ordering::SeqCst);
        assert_eq!(
            cache.get_fresh("video:abc").unwrap(),
            Some(json!({"viewCount": 5}))
        );

        clock.0.store(1_000 + 86_400, Ordering::SeqCst);
        assert_eq!(cache.get_fresh("video:abc").unwrap(), None);
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data/yt_cache.json");
        let backend = JsonFileBackend::new(&path);

        assert_eq!(backend.get("video:x").unwrap(), None);
        backend
            .put(
                "video:x",
                CacheEntry {
                    data: json!({"title": "t"}),
                    fetched_at: 12.5,
                },
            )
            .unwrap();
        backend
            .put(
                "channel:y",
                CacheEntry {
                    data: json!({"subscriberCount": 7}),
                    fetched_at: 13.0,
                },
            )
            .unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["video:x"]["_fetched_at"], 12.5);
        assert_eq!(raw["channel:y"]["data"]["subscriberCount"], 7);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let backend = JsonFileBackend::new(&path);
        assert_eq!(backend.get("video:x").unwrap(), None);
    }

    #[test]
    fn test_missing_timestamp_is_stale() {
        let entry: CacheEntry = serde_json::from_value(json!({"data": 1})).unwrap();
        assert!(!TtlPolicy::default().is_fresh(&entry, DEFAULT_TTL_SECONDS + 1.0));
    }
}
