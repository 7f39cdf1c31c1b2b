//! # Redis Cache Implementation
//!
//! Provides a synchronous wrapper for Redis key-value operations, backing
//! the [`QueryCache`] collaborator with a process-external store so cached
//! query responses survive across extraction runs and are shared between
//! them.

use redis::{Client, Commands, RedisResult};
use serde_json::Value;

use super::QueryCache;

/// A handler for Redis cache interactions.
pub struct RedisCache {
    /// The internal Redis client instance.
    client: Client,
}

impl RedisCache {
    /// Creates a new `RedisCache` from a connection string.
    ///
    /// # Arguments
    /// * `url` - The redis URL (e.g., "redis://127.0.0.1/").
    pub fn new(url: &str) -> RedisResult<Self> {
        // Open the connection to the redis server
        let client = Client::open(url)?;
        Ok(Self { client })
    }
}

impl QueryCache for RedisCache {
    /// Looks up `key` and decodes the stored JSON document. Connection or
    /// decode problems count as a miss.
    fn retrieve(&self, key: &str) -> Option<Value> {
        let mut conn = self.client.get_connection().ok()?;
        let raw: String = conn.get(key).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Stores `value` under `key` with a TTL, serialized as JSON text.
    /// Errors are swallowed; a cache write must never fail a query.
    fn store(&self, key: &str, value: &Value, ttl_hours: u64) {
        let Ok(mut conn) = self.client.get_connection() else {
            return;
        };
        let Ok(raw) = serde_json::to_string(value) else {
            return;
        };
        let _: RedisResult<()> = conn.set_ex(key, raw, ttl_hours * 3600);
    }
}
