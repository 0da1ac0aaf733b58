//! Kickoff Cache - SQLite-backed HTTP response cache
//!
//! Serves remote JSON/HTML resources from a local TTL cache and falls back to
//! live requests when entries are missing or stale.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEntry, CacheStore, StalenessPolicy};
pub use config::Config;
pub use error::{CacheError, Result};
pub use fetch::{FetchRequest, Fetcher, Payload, Transform};
pub use tasks::spawn_purge_task;
