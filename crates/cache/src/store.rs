use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::key::{CacheKind, cache_key};

/// On-disk shape of one cached artifact. Immutable once written.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    kind: String,
    input: String,
    output: Value,
}

#[derive(Default)]
struct Counters {
    memory_hits: AtomicUsize,
    disk_hits: AtomicUsize,
    misses: AtomicUsize,
    corrupt_evictions: AtomicUsize,
    write_failures: AtomicUsize,
}

/// Content-addressed, two-tier (memory + directory) cache.
///
/// Cloning is cheap; clones share both tiers.
#[derive(Clone)]
pub struct SourceCache {
    dir: PathBuf,
    memory: Arc<DashMap<String, Value>>,
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
    counters: Arc<Counters>,
}

impl SourceCache {
    /// Does not touch the filesystem; directories are created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory tree for every cache kind if absent.
    pub async fn init(&self) -> io::Result<()> {
        for kind in [CacheKind::DictionaryLookup, CacheKind::ModelQuery] {
            fs::create_dir_all(self.dir.join(kind.as_str())).await?;
        }
        Ok(())
    }

    /// Where the artifact for `(kind, key_material)` lives on disk.
    pub fn entry_path(&self, kind: CacheKind, key_material: &str) -> PathBuf {
        self.path_for_key(kind, &cache_key(kind, key_material))
    }

    /// Return the cached value for `(kind, key_material)`, or run `compute`
    /// and cache its success.
    ///
    /// Failures from `compute` are returned as-is and never cached. Concurrent
    /// calls for the same key wait for the first one instead of computing again.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        kind: CacheKind,
        key_material: &str,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = cache_key(kind, key_material);
        let lock = self.inflight.entry(key.clone()).or_default().clone();

        let result = {
            let _guard = lock.lock().await;
            self.lookup_or_compute(kind, &key, key_material, compute).await
        };

        drop(lock);
        self.inflight.remove_if(&key, |_, l| Arc::strong_count(l) == 1);

        result
    }

    async fn lookup_or_compute<T, E, F, Fut>(
        &self,
        kind: CacheKind,
        key: &str,
        key_material: &str,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.memory_hit(key) {
            return Ok(value);
        }

        let path = self.path_for_key(kind, key);
        if let Some(value) = self.disk_hit(key, &path).await {
            return Ok(value);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!(kind = %kind, key = key, "Cache miss");

        let output = compute().await?;
        self.persist(kind, key, key_material, &output, &path).await;

        Ok(output)
    }

    fn memory_hit<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = self.memory.get(key).map(|e| e.value().clone())?;

        match serde_json::from_value(cached) {
            Ok(value) => {
                self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Err(e) => {
                warn!(key = key, error = %e, "Memory cache entry has unexpected shape, dropping");
                self.memory.remove(key);
                None
            }
        }
    }

    async fn disk_hit<T: DeserializeOwned>(&self, key: &str, path: &Path) -> Option<T> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache entry, treating as miss");
                return None;
            }
        };

        let parsed = serde_json::from_slice::<CacheRecord>(&bytes).and_then(|record| {
            let value = serde_json::from_value::<T>(record.output.clone())?;
            Ok((record.output, value))
        });

        match parsed {
            Ok((raw, value)) => {
                self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
                debug!(path = %path.display(), "Cache hit on disk");
                self.memory.insert(key.to_string(), raw);
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry, evicting");
                self.counters.corrupt_evictions.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = fs::remove_file(path).await {
                    warn!(path = %path.display(), error = %e, "Failed to evict corrupt cache entry");
                }
                None
            }
        }
    }

    /// Best effort: a failed write is logged and counted, never returned.
    async fn persist<T: Serialize>(
        &self,
        kind: CacheKind,
        key: &str,
        key_material: &str,
        output: &T,
        path: &Path,
    ) {
        let output = match serde_json::to_value(output) {
            Ok(value) => value,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to serialize computed value, not caching");
                self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        self.memory.insert(key.to_string(), output.clone());

        let record = CacheRecord {
            kind: kind.as_str().to_string(),
            input: key_material.to_string(),
            output,
        };

        if let Err(e) = write_atomic(path, &record).await {
            warn!(path = %path.display(), error = %e, "Failed to write cache entry");
            self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn path_for_key(&self, kind: CacheKind, key: &str) -> PathBuf {
        self.dir.join(kind.as_str()).join(format!("{}.json", key))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.len(),
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            corrupt_evictions: self.counters.corrupt_evictions.load(Ordering::Relaxed),
            write_failures: self.counters.write_failures.load(Ordering::Relaxed),
        }
    }
}

async fn write_atomic(path: &Path, record: &CacheRecord) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(record).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub memory_hits: usize,
    pub disk_hits: usize,
    pub misses: usize,
    pub corrupt_evictions: usize,
    pub write_failures: usize,
}
