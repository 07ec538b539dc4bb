//! In-memory cache backend.
//!
//! Not durable: everything is lost on restart. Used for local development
//! (`CACHE_BACKEND=memory`) and as the injected store in tests.

use super::{CacheResult, ImageCache};
use crate::models::{CacheEntry, CacheKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry without going through `set`.
    pub async fn with_entry(self, key: CacheKey, image_reference: &str) -> Self {
        self.entries.write().await.insert(
            key.clone(),
            CacheEntry::new(key, image_reference.to_string()),
        );
        self
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ImageCache for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let entry = self.entries.read().await.get(key).cloned();
        match &entry {
            Some(_) => tracing::debug!("Cache hit for word: {}", key.word),
            None => tracing::debug!("Cache miss for word: {}", key.word),
        }
        Ok(entry)
    }

    async fn set(&self, key: &CacheKey, image_reference: &str) -> CacheResult<()> {
        let entry = CacheEntry::new(key.clone(), image_reference.to_string());
        let previous = self.entries.write().await.insert(key.clone(), entry);
        if previous.is_some() {
            tracing::info!("Updated existing cache entry for word: {}", key.word);
        } else {
            tracing::info!("Created new cache entry for word: {}", key.word);
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        if self.entries.write().await.remove(key).is_some() {
            tracing::info!("Deleted cache entry for word: {}", key.word);
        } else {
            tracing::debug!("No cache entry found to delete for word: {}", key.word);
        }
        Ok(())
    }

    async fn clear(&self) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        tracing::info!("Cleared {} entries from cache", removed);
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cat() -> CacheKey {
        CacheKey::new("cat", "noun", "a small domesticated feline")
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_miss() {
        let cache = InMemoryCache::new();
        assert!(cache.get(&cat()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_twice_keeps_single_latest_entry() {
        let cache = InMemoryCache::new();
        cache.set(&cat(), "https://img/1.png").await.unwrap();
        let first = cache.get(&cat()).await.unwrap().unwrap();

        cache.set(&cat(), "https://img/2.png").await.unwrap();
        let second = cache.get(&cat()).await.unwrap().unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(second.image_reference, "https://img/2.png");
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let cache = InMemoryCache::new();
        cache.set(&cat(), "https://img/cat.png").await.unwrap();

        let upper = CacheKey::new("Cat", "noun", "a small domesticated feline");
        assert!(cache.get(&upper).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_does_not_trim() {
        let cache = InMemoryCache::new();
        cache.set(&cat(), "https://img/cat.png").await.unwrap();

        let padded = CacheKey::new("cat ", "noun", "a small domesticated feline");
        assert!(cache.get(&padded).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = InMemoryCache::new().with_entry(cat(), "https://img").await;
        cache.delete(&cat()).await.unwrap();
        cache.delete(&cat()).await.unwrap();
        assert!(cache.get(&cat()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_reports_count_and_empties() {
        let cache = InMemoryCache::new()
            .with_entry(cat(), "https://img/cat.png")
            .await
            .with_entry(CacheKey::new("dog", "", "a loyal pet"), "https://img/dog.png")
            .await;

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get(&cat()).await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_set_same_key_leaves_one_entry() {
        let cache = InMemoryCache::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.set(&cat(), &format!("https://img/{i}")).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(cache.len().await, 1);
    }
}
