//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};
use crate::fetch::{FetchStats, Payload};

/// Response body for entry lookups (GET /cache/:key, GET /entries/:key)
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: String,
    pub value: String,
    pub ttl: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Whether the entry would be served by a load right now
    pub fresh: bool,
    /// Seconds of freshness left
    pub ttl_remaining: u64,
}

impl EntryResponse {
    pub fn new(entry: CacheEntry, now: DateTime<Utc>, fresh: bool) -> Self {
        let ttl_remaining = if fresh { entry.ttl_remaining(now) } else { 0 };
        Self {
            key: entry.key,
            value: entry.value,
            ttl: entry.ttl,
            created: entry.created,
            updated: entry.updated,
            fresh,
            ttl_remaining,
        }
    }
}

/// Response body for the save operation (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    pub ttl: u64,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, ttl: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' saved successfully", key),
            key,
            ttl,
        }
    }
}

/// Response body for a cached fetch (POST /fetch)
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// Key the payload is cached under
    pub key: String,
    pub payload: Payload,
}

/// Response body for POST /purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub purged: usize,
    pub grace: u64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub fetch: FetchStats,
    /// Cache hit rate, stale loads counted as misses
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, fetch: FetchStats) -> Self {
        let hit_rate = cache.hit_rate();
        Self {
            cache,
            fetch,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
