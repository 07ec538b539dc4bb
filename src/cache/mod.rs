//! Lookup cache for generated image references
//!
//! Maps an exact (word, part-of-speech, definition) key to the image
//! reference produced for it. Entries never expire; they are overwritten on
//! regeneration and removed only by explicit delete or clear.

pub mod memory;
pub mod mongo;

pub use memory::InMemoryCache;
pub use mongo::{MongoCache, MongoCacheConfig};

use crate::models::{CacheEntry, CacheKey};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Store-level failures. A missing entry is never one of these.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache entry decode error: {0}")]
    Decode(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[async_trait]
pub trait ImageCache: Send + Sync {
    /// Exact-match lookup. `Ok(None)` is a miss.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>>;

    /// Insert or overwrite the entry for `key`, refreshing `created_at`.
    async fn set(&self, key: &CacheKey, image_reference: &str) -> CacheResult<()>;

    /// Remove the entry for `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> CacheResult<u64>;

    /// Release the underlying connection.
    async fn close(&self) {}

    fn backend_name(&self) -> &'static str;
}
