//! Stale Entry Purge Task
//!
//! Background task that periodically deletes entries which have been stale
//! for longer than a grace period. Without it the table only ever grows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{with_store, CacheStore};

/// Spawns a background task that purges long-stale entries every
/// `interval_secs` seconds.
///
/// Returns `None` when `interval_secs` is 0, which disables purging.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::in_memory()?);
/// let handle = spawn_purge_task(store.clone(), 3600, 604_800);
/// // Later, during shutdown:
/// if let Some(handle) = handle { handle.abort(); }
/// ```
pub fn spawn_purge_task(
    store: Arc<CacheStore>,
    interval_secs: u64,
    grace_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        debug!("purge task disabled");
        return None;
    }

    let interval = Duration::from_secs(interval_secs);

    Some(tokio::spawn(async move {
        info!(interval_secs, grace_secs, "starting stale entry purge task");

        loop {
            tokio::time::sleep(interval).await;

            match with_store(&store, move |s| s.purge_stale(grace_secs)).await {
                Ok(0) => debug!("purge: no long-stale entries"),
                Ok(removed) => info!(removed, "purge: removed stale entries"),
                Err(e) => warn!(error = %e, "purge failed"),
            }
        }
    }))
}
