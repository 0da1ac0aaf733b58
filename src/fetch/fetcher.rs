//! Cached fetch
//!
//! Serves requests from the [`CacheStore`] while fresh and falls back to a
//! live HTTP GET otherwise. Network and store problems never surface as
//! errors: the caller just gets no data, or uncached data. Store calls run on
//! the blocking pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{with_store, CacheStore};
use crate::config::{Config, DEFAULT_TTL};
use crate::error::{CacheError, Result};
use crate::fetch::request::{FetchRequest, Payload};

/// Counters for the fetch path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchStats {
    /// Requests handled
    pub requests: u64,
    /// Requests answered from the store
    pub cache_hits: u64,
    /// Upstream responses accepted and returned
    pub upstream_fetches: u64,
    /// Upstream attempts that produced no data
    pub upstream_failures: u64,
    /// Store reads or writes that failed and were skipped
    pub store_errors: u64,
}

/// HTTP client bound to a cache store.
pub struct Fetcher {
    client: reqwest::Client,
    store: Arc<CacheStore>,
    default_ttl: u64,
    concurrency: usize,
    stats: Mutex<FetchStats>,
}

impl Fetcher {
    pub fn new(store: Arc<CacheStore>, client: reqwest::Client) -> Self {
        Self {
            client,
            store,
            default_ttl: DEFAULT_TTL,
            concurrency: 8,
            stats: Mutex::new(FetchStats::default()),
        }
    }

    /// Builds a fetcher whose client uses the configured timeout and User-Agent.
    pub fn from_config(store: Arc<CacheStore>, config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CacheError::Internal(format!("cannot build http client: {e}")))?;

        Ok(Self::new(store, client)
            .with_default_ttl(config.default_ttl)
            .with_concurrency(config.fetch_concurrency))
    }

    pub fn with_default_ttl(mut self, ttl: u64) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn record(&self, update: impl FnOnce(&mut FetchStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }

    // == Fetch ==
    /// Returns the payload for `request`, from cache when fresh.
    ///
    /// `None` means no usable data: the upstream failed, answered with a
    /// non-200 status, or returned something that is not JSON when JSON was
    /// asked for. Such responses are never cached.
    pub async fn fetch(&self, request: &FetchRequest) -> Option<Payload> {
        let key = request.key();
        self.record(|s| s.requests += 1);

        let load_key = key.clone();
        match with_store(&self.store, move |store| store.load(&load_key)).await {
            Ok(entry) => match request.decode(&entry.value) {
                Some(payload) => {
                    self.record(|s| s.cache_hits += 1);
                    return Some(payload);
                }
                None => debug!(key = %key, "cached value unreadable; refetching"),
            },
            Err(e) if e.is_miss() => {}
            Err(e) => {
                warn!(key = %key, error = %e, "cache store unavailable; fetching live");
                self.record(|s| s.store_errors += 1);
            }
        }

        let Some(body) = self.download(request).await else {
            self.record(|s| s.upstream_failures += 1);
            return None;
        };

        let text = request.transform.apply(&body).trim().to_string();

        let Some(payload) = request.decode(&text) else {
            warn!(key = %key, "upstream response is not valid JSON; not caching");
            self.record(|s| s.upstream_failures += 1);
            return None;
        };

        let ttl = request.ttl.unwrap_or(self.default_ttl);
        let save_key = key.clone();
        let saved = with_store(&self.store, move |store| store.save(&save_key, &text, ttl)).await;
        if let Err(e) = saved {
            warn!(key = %key, error = %e, "failed to cache response");
            self.record(|s| s.store_errors += 1);
        }

        self.record(|s| s.upstream_fetches += 1);
        debug!(key = %key, ttl, "cached fresh response");
        Some(payload)
    }

    /// Fetches every request with at most `concurrency` in flight.
    ///
    /// Results line up with the input order.
    pub async fn fetch_all(&self, requests: &[FetchRequest]) -> Vec<Option<Payload>> {
        stream::iter(requests.iter().map(|request| self.fetch(request)))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn download(&self, request: &FetchRequest) -> Option<String> {
        let url = match request.resolved_url() {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %request.url, error = %e, "cannot build request url");
                return None;
            }
        };

        let response = match self.client.get(url.clone()).query(&request.params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "upstream request failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            warn!(url = %url, status = %response.status(), "upstream returned non-200");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = %url, error = %e, "failed to read upstream body");
                None
            }
        }
    }
}
