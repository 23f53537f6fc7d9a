//! Translation cache stores.
//!
//! Two backends share one contract: a directory of blob files with `.md5`
//! sidecars, and a Redis instance holding one JSON record per key. The backend
//! is chosen once at start-up.

mod cache_interface;
pub mod cache_keys;
mod filesystem_cache;
mod redis_cache;

pub use cache_interface::TranslationCache;
pub use filesystem_cache::FilesystemCache;
pub use redis_cache::{create_pool, RedisCache};
