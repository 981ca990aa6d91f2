//! Cache persistence layer
//!
//! The classifier never touches the filesystem; the runner loads and saves the
//! cache through a [`CacheStore`]. A JSON file is the production backend.

use super::ClassificationCache;
use crate::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for cache persistence
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the persisted cache; a store with nothing saved yields an empty cache
    async fn load(&self) -> Result<ClassificationCache>;

    /// Replace the persisted cache with `cache` in full
    async fn save(&self, cache: &ClassificationCache) -> Result<()>;

    /// Human-readable location for reporting
    fn location(&self) -> String;
}

#[async_trait::async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn load(&self) -> Result<ClassificationCache> {
        (**self).load().await
    }

    async fn save(&self, cache: &ClassificationCache) -> Result<()> {
        (**self).save(cache).await
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Pretty-printed JSON object on disk
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

#[async_trait::async_trait]
impl CacheStore for JsonFileCacheStore {
    async fn load(&self) -> Result<ClassificationCache> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => {
                let cache = ClassificationCache::from_json(&json)?;
                debug!(path = %self.path.display(), entries = cache.len(), "Loaded sector cache");
                Ok(cache)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No sector cache yet, starting empty");
                Ok(ClassificationCache::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, cache: &ClassificationCache) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // The target is only ever replaced by rename
        let staging = self.staging_path();
        fs::write(&staging, cache.to_json_pretty()?).await?;
        fs::rename(&staging, &self.path).await?;

        debug!(path = %self.path.display(), entries = cache.len(), "Saved sector cache");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store for tests and embedding
pub struct InMemoryCacheStore {
    cache: Arc<RwLock<ClassificationCache>>,
    saves: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::with_cache(ClassificationCache::new())
    }

    pub fn with_cache(cache: ClassificationCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Copy of the most recently saved cache
    pub async fn snapshot(&self) -> ClassificationCache {
        self.cache.read().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn load(&self) -> Result<ClassificationCache> {
        Ok(self.cache.read().await.clone())
    }

    async fn save(&self, cache: &ClassificationCache) -> Result<()> {
        *self.cache.write().await = cache.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
