//! MongoDB cache backend.
//!
//! One document per key in a single collection, with a unique compound index
//! over (`word`, `partOfSpeech`, `definition`). Writes use replace-with-upsert
//! filtered on the full key, so the store itself decides races between
//! concurrent writers for the same key.
//!
//! Every operation is bounded by [`OPERATION_TIMEOUT`]; connecting and the
//! startup ping are bounded by [`CONNECT_TIMEOUT`].

use super::{CacheError, CacheResult, ImageCache};
use crate::models::{CacheEntry, CacheKey};
use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use std::future::IntoFuture;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoCacheConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

/// Stored document shape. Field names match documents written by earlier
/// deployments of the service, hence `imageData` for the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbCacheEntry {
    word: String,
    #[serde(rename = "partOfSpeech")]
    part_of_speech: String,
    definition: String,
    #[serde(rename = "imageData")]
    image_data: String,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl DbCacheEntry {
    fn new(key: &CacheKey, image_reference: &str) -> Self {
        Self {
            word: key.word.clone(),
            part_of_speech: key.part_of_speech.clone(),
            definition: key.definition.clone(),
            image_data: image_reference.to_string(),
            created_at: bson::DateTime::now(),
        }
    }

    fn into_entry(self) -> CacheResult<CacheEntry> {
        let millis = self.created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            CacheError::Decode(format!("createdAt out of range: {millis}"))
        })?;
        Ok(CacheEntry {
            key: CacheKey {
                word: self.word,
                part_of_speech: self.part_of_speech,
                definition: self.definition,
            },
            image_reference: self.image_data,
            created_at,
        })
    }
}

fn key_filter(key: &CacheKey) -> Document {
    doc! {
        "word": key.word.as_str(),
        "partOfSpeech": key.part_of_speech.as_str(),
        "definition": key.definition.as_str(),
    }
}

fn backend_error(err: mongodb::error::Error) -> CacheError {
    CacheError::Backend(err.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Created,
    Updated,
    NothingWritten,
}

fn write_outcome(matched_count: u64, upserted: bool) -> WriteOutcome {
    if upserted {
        WriteOutcome::Created
    } else if matched_count > 0 {
        WriteOutcome::Updated
    } else {
        WriteOutcome::NothingWritten
    }
}

/// Run one driver operation under `limit`, mapping both failure modes.
async fn bounded<F, T>(limit: Duration, op: F) -> CacheResult<T>
where
    F: IntoFuture<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result.map_err(backend_error),
        Err(_) => Err(CacheError::Timeout(limit)),
    }
}

pub struct MongoCache {
    client: Client,
    collection: Collection<DbCacheEntry>,
}

impl MongoCache {
    /// Connect, verify the server answers a ping, and ensure the unique key
    /// index exists. Index creation failure is logged, not fatal.
    pub async fn connect(config: &MongoCacheConfig) -> CacheResult<Self> {
        let mut options = bounded(CONNECT_TIMEOUT, ClientOptions::parse(&config.uri)).await?;
        options.app_name = Some("pictionary-server".to_string());
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);

        let client = Client::with_options(options).map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            backend_error(e)
        })?;

        let database = client.database(&config.database);
        bounded(CONNECT_TIMEOUT, database.run_command(doc! { "ping": 1 }))
            .await
            .map_err(|e| {
                tracing::error!("Failed to ping MongoDB: {}", e);
                e
            })?;
        tracing::info!("Successfully connected to MongoDB");

        let collection = database.collection::<DbCacheEntry>(&config.collection);
        let index = IndexModel::builder()
            .keys(doc! { "word": 1, "partOfSpeech": 1, "definition": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match bounded(CONNECT_TIMEOUT, collection.create_index(index)).await {
            Ok(_) => tracing::info!("Successfully created MongoDB indexes"),
            Err(e) => tracing::warn!("Failed to create index: {}", e),
        }

        Ok(Self { client, collection })
    }
}

#[async_trait]
impl ImageCache for MongoCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let found = bounded(OPERATION_TIMEOUT, self.collection.find_one(key_filter(key)))
            .await
            .map_err(|e| {
                tracing::error!("Failed to get cache entry: {}", e);
                e
            })?;

        match found {
            Some(doc) => {
                tracing::debug!("Cache hit for word: {}", key.word);
                doc.into_entry().map(Some)
            }
            None => {
                tracing::debug!("Cache miss for word: {}", key.word);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, image_reference: &str) -> CacheResult<()> {
        let filter = key_filter(key);
        let replacement = DbCacheEntry::new(key, image_reference);

        let upsert = self
            .collection
            .replace_one(filter.clone(), &replacement)
            .upsert(true);
        let result = match tokio::time::timeout(OPERATION_TIMEOUT, upsert).await {
            Err(_) => return Err(CacheError::Timeout(OPERATION_TIMEOUT)),
            Ok(Ok(result)) => result,
            // A concurrent upsert for the same key inserted first; the document
            // now exists, so replacing it resolves to last-writer-wins.
            Ok(Err(e)) if is_duplicate_key(&e) => {
                tracing::debug!("Upsert raced on word: {}, replacing", key.word);
                bounded(
                    OPERATION_TIMEOUT,
                    self.collection.replace_one(filter, &replacement),
                )
                .await
                .map_err(|e| {
                    tracing::error!("Failed to set cache entry after upsert race: {}", e);
                    e
                })?
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to set cache entry: {}", e);
                return Err(backend_error(e));
            }
        };

        match write_outcome(result.matched_count, result.upserted_id.is_some()) {
            WriteOutcome::Created => {
                tracing::info!("Created new cache entry for word: {}", key.word)
            }
            WriteOutcome::Updated => {
                tracing::info!("Updated existing cache entry for word: {}", key.word)
            }
            // Only reachable when the entry is deleted between the raced upsert
            // and the replace.
            WriteOutcome::NothingWritten => {
                tracing::debug!("Cache entry for word: {} vanished before replace", key.word)
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let result = bounded(OPERATION_TIMEOUT, self.collection.delete_one(key_filter(key)))
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete cache entry: {}", e);
                e
            })?;

        if result.deleted_count > 0 {
            tracing::info!("Deleted cache entry for word: {}", key.word);
        } else {
            tracing::debug!("No cache entry found to delete for word: {}", key.word);
        }
        Ok(())
    }

    async fn clear(&self) -> CacheResult<u64> {
        let result = bounded(OPERATION_TIMEOUT, self.collection.delete_many(doc! {}))
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear cache: {}", e);
                e
            })?;

        tracing::info!("Cleared {} entries from cache", result.deleted_count);
        Ok(result.deleted_count)
    }

    async fn close(&self) {
        match tokio::time::timeout(OPERATION_TIMEOUT, self.client.clone().shutdown()).await {
            Ok(()) => tracing::info!("Successfully closed MongoDB connection"),
            Err(_) => tracing::error!("Failed to close MongoDB connection: timed out"),
        }
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_filter_uses_stored_field_names() {
        let filter = key_filter(&CacheKey::new("cat", "", "a pet"));
        assert_eq!(filter.get_str("word").unwrap(), "cat");
        assert_eq!(filter.get_str("partOfSpeech").unwrap(), "");
        assert_eq!(filter.get_str("definition").unwrap(), "a pet");
    }

    #[test]
    fn test_write_outcome_reports_missed_replace() {
        assert_eq!(write_outcome(0, true), WriteOutcome::Created);
        assert_eq!(write_outcome(1, false), WriteOutcome::Updated);
        assert_eq!(write_outcome(0, false), WriteOutcome::NothingWritten);
    }

    #[test]
    fn test_db_entry_round_trips_to_domain_entry() {
        let key = CacheKey::new("cat", "noun", "a pet");
        let stored = DbCacheEntry::new(&key, "https://img/cat.png");
        let document = bson::to_document(&stored).unwrap();
        assert_eq!(document.get_str("imageData").unwrap(), "https://img/cat.png");
        assert!(document.get_datetime("createdAt").is_ok());

        let entry = stored.into_entry().unwrap();
        assert_eq!(entry.key, key);
        assert_eq!(entry.image_reference, "https://img/cat.png");
    }

    #[cfg(feature = "mongo-tests")]
    mod live {
        use super::*;
        use crate::cache::ImageCache;
        use std::sync::Arc;

        async fn connect_fresh() -> MongoCache {
            let uri = std::env::var("MONGODB_TEST_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
            let collection = format!("cache_test_{}", Utc::now().timestamp_nanos_opt().unwrap());
            MongoCache::connect(&MongoCacheConfig {
                uri,
                database: "pictionary-app-test".to_string(),
                collection,
            })
            .await
            .expect("mongo test server")
        }

        #[tokio::test]
        async fn test_set_get_delete_clear_against_server() {
            let cache = connect_fresh().await;
            let key = CacheKey::new("cat", "noun", "a pet");

            assert!(cache.get(&key).await.unwrap().is_none());
            cache.set(&key, "https://img/1").await.unwrap();
            cache.set(&key, "https://img/2").await.unwrap();
            let entry = cache.get(&key).await.unwrap().unwrap();
            assert_eq!(entry.image_reference, "https://img/2");

            let upper = CacheKey::new("Cat", "noun", "a pet");
            assert!(cache.get(&upper).await.unwrap().is_none());

            cache.delete(&key).await.unwrap();
            cache.delete(&key).await.unwrap();
            cache.set(&key, "https://img/3").await.unwrap();
            assert_eq!(cache.clear().await.unwrap(), 1);
            assert!(cache.get(&key).await.unwrap().is_none());
            cache.close().await;
        }

        #[tokio::test]
        async fn test_concurrent_upserts_leave_one_document() {
            let cache = Arc::new(connect_fresh().await);
            let key = CacheKey::new("race", "", "same key");

            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = cache.clone();
                    let key = key.clone();
                    tokio::spawn(async move { cache.set(&key, &format!("https://img/{i}")).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(cache.clear().await.unwrap(), 1);
        }
    }
}
