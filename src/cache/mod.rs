//! Cache layer
//!
//! In-process caching (moka) for read-only content such as category headers.
//! Favorite flags and authentication state are never cached.
//!
//! # Usage
//!
//! ```rust,ignore
//! use colormypage::cache::{create_cache, CacheLayer};
//! use colormypage::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("category:1", &category, cache.default_ttl()).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Generic over the stored value, so it is used through concrete types
/// rather than as a trait object.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;
}

/// Cache key for a category header
pub fn category_key(id: i64) -> String {
    format!("category:{}", id)
}

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    tracing::info!(
        "Using in-memory cache (capacity {}, ttl {}s)",
        config.max_capacity,
        config.ttl_seconds
    );
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}
