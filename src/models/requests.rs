//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;
use crate::fetch::{FetchRequest, Transform};

/// Request body for the save operation (PUT /cache)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds (service default when omitted)
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Named response transforms accepted over the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformName {
    #[default]
    None,
    Jsonp,
}

impl From<TransformName> for Transform {
    fn from(name: TransformName) -> Self {
        match name {
            TransformName::None => Transform::None,
            TransformName::Jsonp => Transform::StripJsonp,
        }
    }
}

/// Request body for a cached fetch (POST /fetch)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchBody {
    pub url: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub transform: TransformName,
    #[serde(default)]
    pub select: Option<String>,
}

impl FetchBody {
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() && self.base_url.is_none() {
            return Some("url cannot be empty".to_string());
        }
        if let Some(key) = &self.cache_key {
            if key.is_empty() || key.len() > MAX_KEY_LENGTH {
                return Some(format!("cache_key must be 1 to {} bytes", MAX_KEY_LENGTH));
            }
        }
        None
    }
}

impl From<FetchBody> for FetchRequest {
    fn from(body: FetchBody) -> Self {
        FetchRequest {
            url: body.url,
            base_url: body.base_url,
            ttl: body.ttl,
            params: body.params,
            transform: body.transform.into(),
            json: body.json,
            cache_key: body.cache_key,
            select: body.select,
        }
    }
}

/// Request body for POST /purge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurgeRequest {
    /// Seconds an entry must have been stale; service default when omitted
    #[serde(default)]
    pub grace: Option<u64>,
}
