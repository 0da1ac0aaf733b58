//! Cache Module
//!
//! Provides the SQLite-backed response store with TTL-based staleness.

mod clock;
mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, StalenessPolicy};
pub use stats::CacheStats;
pub use store::{with_store, CacheStore};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 8 * 1024 * 1024; // 8 MB
