//! API Module
//!
//! HTTP handlers and routing for the local cache service.
//!
//! # Endpoints
//! - `PUT /cache` - Save a key-value pair
//! - `GET /cache/:key` - Fresh value for a key
//! - `GET /entries/:key` - Stored entry regardless of age
//! - `POST /fetch` - Fetch a URL through the cache
//! - `POST /purge` - Delete long-stale entries
//! - `GET /stats` - Cache and fetch statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
