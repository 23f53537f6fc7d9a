//! Redis container shared by the cache integration tests.

use deadpool_redis::Pool;
use polyglot_config::RedisConfig;
use polyglot_service::{create_pool, RedisCache};
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::{Redis, REDIS_PORT};

/// A throwaway Redis server with a connected pool.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    pool: Pool,
}

impl TestRedis {
    /// Starts a fresh Redis container and waits until it answers `PING`.
    pub async fn new() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .expect("Failed to get Redis port");

        let config = RedisConfig {
            url: format!("redis://127.0.0.1:{}/0", port),
            pool_size: 4,
        };
        let pool = Self::connect_with_retry(&config, 30).await;

        Self {
            _container: container,
            pool,
        }
    }

    /// Raw pool, for assertions the cache does not expose.
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    /// A cache over this server with the given TTL.
    pub fn cache(&self, ttl: Duration) -> RedisCache {
        RedisCache::new(self.pool.clone(), ttl)
    }

    async fn connect_with_retry(config: &RedisConfig, max_attempts: u32) -> Pool {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match create_pool(config).await {
                Ok(pool) => return pool,
                Err(e) => {
                    if attempts >= max_attempts {
                        panic!("Failed to connect to Redis after {} attempts: {}", max_attempts, e);
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
