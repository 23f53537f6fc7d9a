//! Redis cache backend.

use super::cache_keys;
use super::TranslationCache;
use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use chrono::{DateTime, Utc};
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Pool, Runtime};
use polyglot_config::RedisConfig;
use polyglot_core::{checksum, CacheItem, CacheKey, PolyglotError, PolyglotResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const SCAN_COUNT: usize = 100;

/// Creates the connection pool and checks it with `PING`.
pub async fn create_pool(config: &RedisConfig) -> PolyglotResult<Pool> {
    info!("Creating Redis connection pool for the translation cache...");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| PolyglotError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| PolyglotError::Configuration(format!("Failed to create pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| PolyglotError::Cache(format!("Failed to get Redis connection: {}", e)))?;
    redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await
        .map_err(|e| PolyglotError::Cache(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

/// Stored form of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    created_at: DateTime<Utc>,
    checksum: String,
    data: String,
}

/// Cache store backed by Redis, one JSON record per key with native expiry.
pub struct RedisCache {
    pool: Pool,
    ttl: Duration,
}

impl RedisCache {
    #[must_use]
    pub fn new(pool: Pool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    async fn get_conn(&self) -> PolyglotResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| PolyglotError::Cache(format!("Failed to get Redis connection: {}", e)))
    }

    fn decode(key: &CacheKey, raw: &str) -> Option<CacheItem> {
        let stored: StoredItem = match serde_json::from_str(raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %key, error = %e, "Undecodable cache record");
                return None;
            }
        };
        let data = match BASE64_STANDARD.decode(stored.data.as_bytes()) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache record holds invalid base64");
                return None;
            }
        };

        let item = CacheItem {
            created_at: stored.created_at,
            checksum: stored.checksum,
            data,
        };
        item.is_intact().then_some(item)
    }
}

#[async_trait]
impl TranslationCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> PolyglotResult<CacheItem> {
        let redis_key = key.redis_key();
        let mut conn = self.get_conn().await?;

        let raw: Option<String> = conn.get(&redis_key).await.map_err(|e| {
            PolyglotError::Cache(format!("Failed to get key '{}': {}", redis_key, e))
        })?;

        let Some(raw) = raw else {
            debug!("Cache miss for key '{}'", redis_key);
            return Err(PolyglotError::CacheMiss);
        };

        Self::decode(key, &raw).ok_or(PolyglotError::CacheMiss)
    }

    async fn set(&self, key: &CacheKey, data: &[u8]) -> PolyglotResult<String> {
        let redis_key = key.redis_key();
        let sum = checksum(data);
        let record = serde_json::to_string(&StoredItem {
            created_at: Utc::now(),
            checksum: sum.clone(),
            data: BASE64_STANDARD.encode(data),
        })?;

        let mut conn = self.get_conn().await?;
        let ttl_secs = self.ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(&redis_key, record, ttl_secs)
            .await
            .map_err(|e| PolyglotError::Cache(format!("Failed to set key '{}': {}", redis_key, e)))?;

        debug!("Cached key '{}' with TTL {}s", redis_key, ttl_secs);
        Ok(sum)
    }

    async fn purge(&self, project_id: u64, language: Option<&str>) -> PolyglotResult<()> {
        let pattern = cache_keys::redis_pattern(project_id, language);
        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut *conn)
                .await
                .map_err(|e| PolyglotError::Cache(format!("Failed to scan keys: {}", e)))?;

            if !keys.is_empty() {
                let removed: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| PolyglotError::Cache(format!("Failed to delete keys: {}", e)))?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn ping(&self) -> PolyglotResult<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| PolyglotError::Cache(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_verifies_checksum() {
        let key = CacheKey::new(1, "en", "po");
        let good = serde_json::json!({
            "created_at": "2024-01-01T00:00:00Z",
            "checksum": checksum(b"hello"),
            "data": BASE64_STANDARD.encode(b"hello"),
        })
        .to_string();
        let item = RedisCache::decode(&key, &good).unwrap();
        assert_eq!(item.data, b"hello");

        let tampered = serde_json::json!({
            "created_at": "2024-01-01T00:00:00Z",
            "checksum": checksum(b"other"),
            "data": BASE64_STANDARD.encode(b"hello"),
        })
        .to_string();
        assert!(RedisCache::decode(&key, &tampered).is_none());
        assert!(RedisCache::decode(&key, "not json").is_none());
    }
}
