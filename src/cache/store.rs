//! Cache Store Module
//!
//! SQLite-backed response store with per-entry TTL. A single connection is
//! guarded by a mutex, so every operation on one store is serialized.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, StalenessPolicy, SystemClock, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        ttl INTEGER NOT NULL DEFAULT 0,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL
    );";

const SELECT_ENTRY: &str =
    "SELECT key, value, ttl, created, updated FROM cache_entries WHERE key = ?1";

const UPSERT_ENTRY: &str = "INSERT INTO cache_entries (key, value, ttl, created, updated)
    VALUES (?1, ?2, ?3, ?4, ?4)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        ttl = excluded.ttl,
        updated = excluded.updated";

// == Cache Store ==
/// Durable key-addressed store of fetched responses.
pub struct CacheStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    policy: StalenessPolicy,
}

struct Inner {
    conn: Connection,
    stats: CacheStats,
}

/// Row as it sits in SQLite, before timestamp conversion.
struct StoredRow {
    key: String,
    value: String,
    ttl: i64,
    created: i64,
    updated: i64,
}

impl StoredRow {
    fn into_entry(self) -> Result<CacheEntry> {
        let created = from_millis(self.created);
        let updated = from_millis(self.updated);

        match (created, updated) {
            (Some(created), Some(updated)) => Ok(CacheEntry {
                key: self.key,
                value: self.value,
                ttl: self.ttl.max(0) as u64,
                created,
                updated,
            }),
            _ => Err(CacheError::Database(format!(
                "corrupt timestamps for key {}",
                self.key
            ))),
        }
    }
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

fn to_sql_ttl(ttl: u64) -> i64 {
    i64::try_from(ttl).unwrap_or(i64::MAX)
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

impl CacheStore {
    // == Constructors ==
    /// Opens or creates the cache database at `path`.
    ///
    /// Missing parent directories are created. A file that is not a valid
    /// database is deleted and recreated; its contents are only a cache.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CacheError::Database(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = match Self::open_connection(path) {
            Ok(conn) => conn,
            Err(e) if is_corruption(&e) => {
                warn!(path = %path.display(), error = %e, "cache database corrupt; recreating");
                std::fs::remove_file(path).map_err(|e| {
                    CacheError::Database(format!("cannot remove corrupt cache: {e}"))
                })?;
                Self::open_connection(path)?
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), "cache database opened");
        Ok(Self::from_connection(conn))
    }

    /// Creates a store backed by an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::from_connection(conn))
    }

    fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(Inner {
                conn,
                stats: CacheStats::new(),
            }),
            clock: Arc::new(SystemClock),
            policy: StalenessPolicy::default(),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the staleness policy.
    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Internal("cache store lock poisoned".to_string()))
    }

    fn select(conn: &Connection, key: &str) -> Result<Option<CacheEntry>> {
        let row = conn
            .query_row(SELECT_ENTRY, params![key], |row| {
                Ok(StoredRow {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    ttl: row.get(2)?,
                    created: row.get(3)?,
                    updated: row.get(4)?,
                })
            })
            .optional()?;

        row.map(StoredRow::into_entry).transpose()
    }

    // == Get ==
    /// Returns the entry for `key` regardless of its age.
    pub fn get(&self, key: &str) -> Result<CacheEntry> {
        let inner = self.lock()?;
        Self::select(&inner.conn, key)?.ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Load ==
    /// Returns the entry for `key` only while it is fresh.
    ///
    /// Yields `NotFound` for unknown keys and `Stale` once the TTL has elapsed.
    pub fn load(&self, key: &str) -> Result<CacheEntry> {
        let mut inner = self.lock()?;
        let now = self.clock.now();

        match Self::select(&inner.conn, key)? {
            Some(entry) if entry.is_fresh(now, self.policy) => {
                inner.stats.record_hit();
                debug!(key, "cache hit");
                Ok(entry)
            }
            Some(entry) => {
                inner.stats.record_stale();
                debug!(key, age_ms = entry.age_ms(now), ttl = entry.ttl, "cache entry stale");
                Err(CacheError::Stale(key.to_string()))
            }
            None => {
                inner.stats.record_miss();
                debug!(key, "cache miss");
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Save ==
    /// Creates or fully replaces the entry for `key`.
    ///
    /// The value is trimmed before storage. `created` is kept from the first
    /// write; `value`, `ttl` and `updated` are rewritten every time.
    pub fn save(&self, key: &str, value: &str, ttl: u64) -> Result<CacheEntry> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let mut inner = self.lock()?;
        let now = self.clock.now().timestamp_millis();

        inner
            .conn
            .execute(UPSERT_ENTRY, params![key, value.trim(), to_sql_ttl(ttl), now])?;
        inner.stats.record_write();

        Self::select(&inner.conn, key)?
            .ok_or_else(|| CacheError::Internal(format!("entry {key} missing after save")))
    }

    // == Purge ==
    /// Deletes entries that have been stale for at least `grace` seconds.
    ///
    /// Returns the number of entries removed.
    pub fn purge_stale(&self, grace: u64) -> Result<usize> {
        let grace_ms = to_sql_ttl(grace).saturating_mul(1000);
        let mut inner = self.lock()?;
        let now = self.clock.now().timestamp_millis();

        let removed = inner.conn.execute(
            "DELETE FROM cache_entries
             WHERE updated + MIN(ttl, 9223372036854775) * 1000 + ?1 <= ?2",
            params![grace_ms, now],
        )?;
        inner.stats.record_purged(removed);

        Ok(removed)
    }

    // == Length ==
    /// Returns the number of stored entries, fresh or not.
    pub fn len(&self) -> Result<usize> {
        let inner = self.lock()?;
        Self::count(&inner.conn)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn count(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as usize)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> Result<CacheStats> {
        let inner = self.lock()?;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(Self::count(&inner.conn)?);
        Ok(stats)
    }
}

// == Async Access ==
/// Runs `op` against the store on the blocking thread pool.
///
/// SQLite calls may wait on file locks, so async callers go through here
/// instead of touching the store from a runtime worker. A task that panics
/// or is cancelled surfaces as [`CacheError::Internal`].
pub async fn with_store<T, F>(store: &Arc<CacheStore>, op: F) -> Result<T>
where
    F: FnOnce(&CacheStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| CacheError::Internal(format!("cache store task failed: {e}")))?
}
