//! Request and Response models for the cache service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FetchBody, PurgeRequest, SetRequest, TransformName};
pub use responses::{
    EntryResponse, FetchResponse, HealthResponse, PurgeResponse, SetResponse, StatsResponse,
};
