//! Integration tests for `RedisCache`.
//!
//! These tests run against a real Redis server using testcontainers.
//! Requires Docker to be available on the system.

mod common;

use common::TestRedis;
use deadpool_redis::redis;
use polyglot_core::{checksum, CacheKey, VersionLabel};
use polyglot_service::TranslationCache;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_set_then_get() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);
    let key = CacheKey::new(42, "en", "key_value_json");

    let sum = cache.set(&key, br#"{"k":"v"}"#).await.expect("Failed to set");
    let item = cache.get(&key).await.expect("Failed to get");

    assert_eq!(item.data, br#"{"k":"v"}"#);
    assert_eq!(item.checksum, sum);
    assert!(item.is_intact());
    cache.ping().await.expect("Failed to ping");
    assert_eq!(cache.backend(), "redis");
}

#[tokio::test]
async fn test_unknown_key_is_miss() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);

    let err = cache.get(&CacheKey::new(1, "en", "po")).await.unwrap_err();
    assert!(err.is_cache_miss());
}

#[tokio::test]
async fn test_checksum_is_deterministic() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);
    let a = CacheKey::new(1, "de", "po");
    let b = CacheKey::new(2, "fr", "json");

    let first = cache.set(&a, b"msgid").await.unwrap();
    let again = cache.set(&a, b"msgid").await.unwrap();
    let other_key = cache.set(&b, b"msgid").await.unwrap();

    assert_eq!(first, checksum(b"msgid"));
    assert_eq!(first, again);
    assert_eq!(first, other_key);
    assert_eq!(cache.get(&a).await.unwrap().checksum, first);
    assert_ne!(cache.set(&a, b"msgstr").await.unwrap(), first);
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(Duration::from_secs(1));
    let key = CacheKey::new(3, "en", "po");

    cache.set(&key, b"short-lived").await.unwrap();

    let mut conn = redis.pool().get().await.unwrap();
    let ttl: i64 = redis::cmd("TTL")
        .arg(key.redis_key())
        .query_async(&mut *conn)
        .await
        .unwrap();
    assert!((0..=1).contains(&ttl), "unexpected TTL {ttl}");

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(cache.get(&key).await.unwrap_err().is_cache_miss());
}

#[tokio::test]
async fn test_purge_language_leaves_siblings() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);
    let en = CacheKey::new(7, "en", "po");
    let en_tagged = CacheKey::new(7, "en", "po").with_tags(["web"]);
    let en_pinned = CacheKey::new(7, "en", "po").with_version(VersionLabel::Pinned("v1".into()));
    let en_us = CacheKey::new(7, "en-us", "po");
    let other_project = CacheKey::new(77, "en", "po");

    for key in [&en, &en_tagged, &en_pinned, &en_us, &other_project] {
        cache.set(key, b"x").await.unwrap();
    }

    cache.purge(7, Some("en")).await.unwrap();

    assert!(cache.get(&en).await.unwrap_err().is_cache_miss());
    assert!(cache.get(&en_tagged).await.unwrap_err().is_cache_miss());
    assert!(cache.get(&en_pinned).await.unwrap_err().is_cache_miss());
    assert!(cache.get(&en_us).await.is_ok());
    assert!(cache.get(&other_project).await.is_ok());

    cache.purge(7, None).await.unwrap();
    assert!(cache.get(&en_us).await.unwrap_err().is_cache_miss());
    assert!(cache.get(&other_project).await.is_ok());

    cache.purge(123, None).await.unwrap();
}

#[tokio::test]
async fn test_purge_spans_several_scan_batches() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);

    let keys: Vec<CacheKey> = (0..350)
        .map(|i| CacheKey::new(9, "en", "po").with_tags([format!("t{i}")]))
        .collect();
    for key in &keys {
        cache.set(key, b"x").await.unwrap();
    }
    let survivor = CacheKey::new(10, "en", "po");
    cache.set(&survivor, b"keep").await.unwrap();

    cache.purge(9, Some("en")).await.unwrap();

    let mut conn = redis.pool().get().await.unwrap();
    let remaining: Vec<String> = redis::cmd("KEYS")
        .arg("9:*")
        .query_async(&mut *conn)
        .await
        .unwrap();
    assert!(remaining.is_empty(), "{} keys survived the purge", remaining.len());
    assert_eq!(cache.get(&survivor).await.unwrap().data, b"keep");
}

#[tokio::test]
async fn test_corrupt_record_is_miss() {
    let redis = TestRedis::new().await;
    let cache = redis.cache(HOUR);
    let key = CacheKey::new(5, "en", "po");

    let mut conn = redis.pool().get().await.unwrap();
    redis::cmd("SET")
        .arg(key.redis_key())
        .arg("not json")
        .query_async::<()>(&mut *conn)
        .await
        .unwrap();

    assert!(cache.get(&key).await.unwrap_err().is_cache_miss());
}
