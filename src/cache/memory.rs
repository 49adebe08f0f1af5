//! In-memory cache implementation using moka
//!
//! Values are stored as JSON so any serializable type fits. Each entry keeps
//! its own deadline, so the TTL passed to `set` is honored even when it is
//! shorter than the cache-wide time-to-live.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries
const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            expires_at: Instant::now() + ttl,
        })
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a cache with 10,000 entries and a 5 minute TTL
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a cache with custom capacity and default TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .build();

        Self { cache, default_ttl }
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired() => {
                self.cache.invalidate(key).await;
                Ok(None)
            }
            Some(entry) => entry.deserialize().map(Some),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        let category = Category::new("Animals".to_string(), "Cute".to_string(), 3);

        cache.set("category:1", &category, Duration::from_secs(60)).await.unwrap();
        let cached: Option<Category> = cache.get("category:1").await.unwrap();

        assert_eq!(cached, Some(category));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();
        let cached: Option<String> = cache.get("missing").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_entry_ttl_expiration() {
        let cache = MemoryCache::new();

        cache.set("short", &"value", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let cached: Option<String> = cache.get("short").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_entry() {
        let cache = MemoryCache::new();
        cache.set("category:7", &"Dinosaurs", Duration::from_secs(60)).await.unwrap();
        cache.set("category:7", &"Dinos", Duration::from_secs(60)).await.unwrap();

        let cached: Option<String> = cache.get("category:7").await.unwrap();
        assert_eq!(cached.as_deref(), Some("Dinos"));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_error() {
        let cache = MemoryCache::new();
        cache.set("n", &"text", Duration::from_secs(60)).await.unwrap();

        assert!(cache.get::<i64>("n").await.is_err());
    }
}
