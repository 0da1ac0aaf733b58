//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    entry_handler, fetch_handler, health_handler, load_handler, purge_handler, set_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Save a key-value pair
/// - `GET /cache/:key` - Fresh value for a key
/// - `GET /entries/:key` - Stored entry regardless of age
/// - `POST /fetch` - Fetch a URL through the cache
/// - `POST /purge` - Delete long-stale entries
/// - `GET /stats` - Cache and fetch statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler))
        .route("/cache/:key", get(load_handler))
        .route("/entries/:key", get(entry_handler))
        .route("/fetch", post(fetch_handler))
        .route("/purge", post(purge_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
