//! Fetch request description and result payload.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{CacheError, Result};
use crate::fetch::key::{derive_key, resolve_url};
use crate::fetch::transform::{pluck, Transform};

/// Everything needed to serve one resource through the cache.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Absolute URL, or a path relative to `base_url`
    pub url: String,
    pub base_url: Option<String>,
    /// Seconds the response stays fresh; the fetcher's default when `None`
    pub ttl: Option<u64>,
    /// Query parameters, kept sorted so they fold into the key deterministically
    pub params: BTreeMap<String, String>,
    pub transform: Transform,
    /// Parse the body as JSON
    pub json: bool,
    /// Explicit key overriding the derived one
    pub cache_key: Option<String>,
    /// Return only the first JSON member with this name
    pub select: Option<String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn select(mut self, name: impl Into<String>) -> Self {
        self.select = Some(name.into());
        self
    }

    /// The key this request is cached under.
    pub fn key(&self) -> String {
        match &self.cache_key {
            Some(key) => key.clone(),
            None => derive_key(&self.url, self.base_url.as_deref(), &self.params),
        }
    }

    /// The URL to request, without query parameters.
    pub fn resolved_url(&self) -> Result<Url> {
        let raw = resolve_url(&self.url, self.base_url.as_deref());
        Url::parse(&raw).map_err(|e| CacheError::InvalidRequest(format!("invalid url {raw}: {e}")))
    }

    /// Turns stored or downloaded text into the payload this request asks for.
    ///
    /// Returns `None` when JSON was requested and the text does not parse.
    pub fn decode(&self, text: &str) -> Option<Payload> {
        if !self.json {
            return Some(Payload::Text(text.to_string()));
        }

        let value: Value = serde_json::from_str(text).ok()?;
        let value = match &self.select {
            Some(name) => pluck(&value, name)
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            None => value,
        };

        Some(Payload::Json(value))
    }
}

/// Result of a cached fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_key() {
        let req = FetchRequest::new("matches/updates")
            .base_url("scores-api.onefootball.com/v1")
            .param("since", "2017-01-01")
            .ttl(9)
            .json();

        assert_eq!(req.ttl, Some(9));
        assert!(req.json);
        assert_eq!(
            req.key(),
            "scores_api_onefootball_com_v1_matches_updates_since_2017_01_01"
        );
    }

    #[test]
    fn test_explicit_cache_key_wins() {
        let req = FetchRequest::new("en.json")
            .base_url("config.onefootball.com")
            .cache_key("sections_en");
        assert_eq!(req.key(), "sections_en");
    }

    #[test]
    fn test_resolved_url() {
        let req = FetchRequest::new("en.json").base_url("config.onefootball.com/api");
        assert_eq!(
            req.resolved_url().unwrap().as_str(),
            "https://config.onefootball.com/api/en.json"
        );

        let bad = FetchRequest::new("http://exa mple.com/");
        assert!(matches!(bad.resolved_url(), Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_decode_text_and_json() {
        let text = FetchRequest::new("x");
        assert_eq!(text.decode("<p>hi</p>"), Some(Payload::Text("<p>hi</p>".into())));

        let json = FetchRequest::new("x").json();
        assert_eq!(json.decode(r#"{"a":1}"#), Some(Payload::Json(json!({"a": 1}))));
        assert_eq!(json.decode("<html>"), None);
    }

    #[test]
    fn test_decode_select() {
        let req = FetchRequest::new("x").json().select("competitions");
        let doc = r#"{"competitions":[{"id":1}],"sections":[]}"#;
        assert_eq!(req.decode(doc), Some(Payload::Json(json!([{"id": 1}]))));

        let missing = FetchRequest::new("x").json().select("teams");
        assert_eq!(missing.decode(doc), Some(Payload::Json(json!([]))));
    }

    #[test]
    fn test_payload_serialize() {
        let json = serde_json::to_value(Payload::Text("hi".into())).unwrap();
        assert_eq!(json, json!({"kind": "text", "data": "hi"}));
    }
}
