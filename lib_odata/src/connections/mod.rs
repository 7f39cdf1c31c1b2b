//! # Connections Module
//!
//! This module handles persistent connections to external services,
//! currently the shared query-response cache.
//!
//! The cache is modeled as a collaborator trait rather than a process-wide
//! global: clients receive a handle at wiring time, tests inject an
//! in-memory fake, and several client instances can safely share one store.

use serde_json::Value;

/// Module for Redis cache operations and connection handling.
pub mod cache_redis;

/// A shared keyed store for decoded query responses.
///
/// Keys are exact request URIs including the query string; values are the
/// decoded JSON bodies. Implementations provide their own internal
/// consistency for concurrent use across client instances; last-write-wins
/// is acceptable. Failures inside an implementation must degrade to a miss
/// (`retrieve`) or a no-op (`store`) — the request path never depends on
/// the cache being healthy.
pub trait QueryCache: Send + Sync {
    /// Looks up a previously stored response body.
    fn retrieve(&self, key: &str) -> Option<Value>;

    /// Stores a response body with a time-to-live in hours.
    fn store(&self, key: &str, value: &Value, ttl_hours: u64);
}
