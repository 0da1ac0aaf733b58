//! Cache Entry Module
//!
//! Defines a persisted cache entry and the rule deciding whether it is still fresh.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Staleness Policy ==
/// How the age of an entry is compared with its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalenessPolicy {
    /// Fresh iff `0 <= now - updated < ttl`. Entries stamped in the future are stale.
    #[default]
    Forward,
    /// Fresh iff `|now - updated| < ttl`. Compatible with caches written by the
    /// desktop player, which tolerated clock skew in both directions.
    Symmetric,
}

impl FromStr for StalenessPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "symmetric" => Ok(Self::Symmetric),
            other => Err(format!("unknown staleness policy: {other}")),
        }
    }
}

impl fmt::Display for StalenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Symmetric => f.write_str("symmetric"),
        }
    }
}

// == Cache Entry ==
/// A stored response and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Unique cache key
    pub key: String,
    /// Stored payload text, usually JSON or HTML
    pub value: String,
    /// Time-to-live in seconds, counted from `updated`
    pub ttl: u64,
    /// First write
    pub created: DateTime<Utc>,
    /// Most recent write
    pub updated: DateTime<Utc>,
}

impl CacheEntry {
    /// Milliseconds since the last write; negative when `updated` is ahead of `now`.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated).num_milliseconds()
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be served at `now`.
    ///
    /// The boundary is strict: once exactly `ttl` seconds have elapsed the
    /// entry is stale. A zero TTL is never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, policy: StalenessPolicy) -> bool {
        let ttl_ms = i64::try_from(self.ttl)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let age = self.age_ms(now);

        match policy {
            StalenessPolicy::Forward => age >= 0 && age < ttl_ms,
            StalenessPolicy::Symmetric => age.saturating_abs() < ttl_ms,
        }
    }

    /// Point in time at which the entry turns stale.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        self.updated
            .checked_add_signed(chrono::Duration::seconds(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Remaining seconds of freshness, 0 once stale.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at() - now).num_seconds().max(0) as u64
    }

    /// Parses the stored value as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.value)
    }
}
