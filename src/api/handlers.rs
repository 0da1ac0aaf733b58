//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{with_store, CacheStore};
use crate::config::{Config, DEFAULT_TTL};
use crate::error::{CacheError, Result};
use crate::fetch::{FetchRequest, Fetcher};
use crate::models::{
    EntryResponse, FetchBody, FetchResponse, HealthResponse, PurgeRequest, PurgeResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub store: Arc<CacheStore>,
    /// Fetcher bound to the same store
    pub fetcher: Arc<Fetcher>,
    /// TTL for saves that name none
    pub default_ttl: u64,
    /// Grace period for purges that name none
    pub purge_grace: u64,
}

impl AppState {
    /// Creates a new AppState around an existing fetcher.
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            store: fetcher.store().clone(),
            fetcher: Arc::new(fetcher),
            default_ttl: DEFAULT_TTL,
            purge_grace: 604_800,
        }
    }

    /// Opens the configured database and builds the fetcher.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = CacheStore::open(&config.db_path)?.with_policy(config.staleness);
        let fetcher = Fetcher::from_config(Arc::new(store), config)?;

        Ok(Self {
            default_ttl: config.default_ttl,
            purge_grace: config.purge_grace,
            ..Self::new(fetcher)
        })
    }
}

/// Handler for PUT /cache
///
/// Creates or replaces an entry.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.unwrap_or(state.default_ttl);
    let entry =
        with_store(&state.store, move |store| store.save(&req.key, &req.value, ttl)).await?;

    Ok(Json(SetResponse::new(entry.key, entry.ttl)))
}

/// Handler for GET /cache/:key
///
/// Returns the entry only while it is fresh.
pub async fn load_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let entry = with_store(&state.store, move |store| store.load(&key)).await?;
    Ok(Json(EntryResponse::new(entry, state.store.now(), true)))
}

/// Handler for GET /entries/:key
///
/// Returns the stored entry whatever its age.
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let entry = with_store(&state.store, move |store| store.get(&key)).await?;
    let now = state.store.now();
    let fresh = entry.is_fresh(now, state.store.policy());

    Ok(Json(EntryResponse::new(entry, now, fresh)))
}

/// Handler for POST /fetch
///
/// Serves a URL through the cache.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Json(body): Json<FetchBody>,
) -> Result<Json<FetchResponse>> {
    if let Some(error_msg) = body.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let request = FetchRequest::from(body);
    request.resolved_url()?;
    let key = request.key();

    match state.fetcher.fetch(&request).await {
        Some(payload) => Ok(Json(FetchResponse { key, payload })),
        None => Err(CacheError::NotFound(format!("no data for {}", request.url))),
    }
}

/// Handler for POST /purge
///
/// Deletes entries stale for longer than the grace period.
pub async fn purge_handler(
    State(state): State<AppState>,
    body: Option<Json<PurgeRequest>>,
) -> Result<Json<PurgeResponse>> {
    let grace = body
        .and_then(|Json(req)| req.grace)
        .unwrap_or(state.purge_grace);

    let purged = with_store(&state.store, move |store| store.purge_stale(grace)).await?;
    info!(purged, grace, "purged stale entries on request");

    Ok(Json(PurgeResponse { purged, grace }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let cache = with_store(&state.store, |store| store.stats()).await?;
    Ok(Json(StatsResponse::new(cache, state.fetcher.stats())))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
