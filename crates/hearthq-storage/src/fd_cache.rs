//! Bounded LRU cache of open segment file descriptors.
//!
//! Sealed segments are immutable, so their descriptors can be shared
//! freely between concurrent consumers. The cache maps absolute path →
//! `Arc<File>`; a hit refreshes recency, a miss opens the file
//! read-only and inserts it, evicting the least recently used entry at
//! capacity. Eviction only drops the cache's own `Arc` — an in-flight
//! read holding a clone keeps the descriptor open until it finishes,
//! which is what serializes eviction with use.
//!
//! With caching disabled every `get` opens a fresh descriptor that
//! closes when the caller drops it.

use lru::LruCache;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use hearthq_core::Result;

pub struct FdCache {
    inner: Option<Mutex<LruCache<PathBuf, Arc<File>>>>,
}

impl FdCache {
    /// Cache up to `capacity` descriptors.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero capacity");
        Self {
            inner: Some(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// A cache that never retains anything; every `get` opens fresh.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Fetch the descriptor for `path`, opening it read-only on a miss.
    pub async fn get(&self, path: &Path) -> Result<Arc<File>> {
        let Some(cache) = &self.inner else {
            return open_read_only(path.to_path_buf()).await;
        };

        {
            let mut cache = cache.lock().await;
            if let Some(file) = cache.get(path) {
                tracing::trace!(path = %path.display(), "fd cache hit");
                return Ok(file.clone());
            }
        }

        // Opened outside the lock so distinct paths open in parallel;
        // a same-path race wastes one descriptor, nothing more.
        let file = open_read_only(path.to_path_buf()).await?;

        let mut cache = cache.lock().await;
        if let Some(existing) = cache.get(path) {
            return Ok(existing.clone());
        }
        if let Some((evicted, _)) = cache.push(path.to_path_buf(), file.clone()) {
            tracing::debug!(path = %evicted.display(), "evicted fd cache entry");
        }
        Ok(file)
    }

    /// Drop every cached descriptor under `dir`. Used when a topic is
    /// deleted or truncated.
    pub async fn purge_dir(&self, dir: &Path) {
        let Some(cache) = &self.inner else { return };
        let mut cache = cache.lock().await;
        let stale: Vec<PathBuf> = cache
            .iter()
            .filter(|(path, _)| path.starts_with(dir))
            .map(|(path, _)| path.clone())
            .collect();
        for path in stale {
            cache.pop(&path);
        }
    }

    /// Drop a single cached descriptor.
    pub async fn purge(&self, path: &Path) {
        let Some(cache) = &self.inner else { return };
        cache.lock().await.pop(path);
    }

    /// Drop everything.
    pub async fn clear(&self) {
        let Some(cache) = &self.inner else { return };
        cache.lock().await.clear();
    }
}

async fn open_read_only(path: PathBuf) -> Result<Arc<File>> {
    let file = tokio::task::spawn_blocking(move || File::open(path))
        .await
        .map_err(|e| std::io::Error::other(e))??;
    Ok(Arc::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(b"data").unwrap();
        path
    }

    #[tokio::test]
    async fn hit_returns_same_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a");
        let cache = FdCache::new(4);

        let first = cache.get(&path).await.unwrap();
        let second = cache.get(&path).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn lru_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a");
        let b = write_file(dir.path(), "b");
        let c = write_file(dir.path(), "c");
        let cache = FdCache::new(2);

        let fd_a = cache.get(&a).await.unwrap();
        let _fd_b = cache.get(&b).await.unwrap();
        let _fd_c = cache.get(&c).await.unwrap(); // evicts a

        let fd_a_again = cache.get(&a).await.unwrap();
        assert!(!Arc::ptr_eq(&fd_a, &fd_a_again));
    }

    #[tokio::test]
    async fn disabled_cache_opens_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a");
        let cache = FdCache::disabled();
        assert!(!cache.is_enabled());

        let first = cache.get(&path).await.unwrap();
        let second = cache.get(&path).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn purge_dir_drops_entries() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("topic");
        std::fs::create_dir(&sub).unwrap();
        let path = write_file(&sub, "seg");
        let cache = FdCache::new(4);

        let first = cache.get(&path).await.unwrap();
        cache.purge_dir(&sub).await;
        let second = cache.get(&path).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FdCache::new(4);
        assert!(cache.get(&dir.path().join("nope")).await.is_err());
    }
}
