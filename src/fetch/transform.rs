//! Response transforms applied before a body is cached, and JSON helpers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Post-fetch rewrite of a response body.
#[derive(Clone, Default)]
pub enum Transform {
    /// Cache the body as received.
    #[default]
    None,
    /// Unwrap a JSONP callback, `cb({...});` becomes `{...}`.
    StripJsonp,
    /// Caller-supplied rewrite.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Transform {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn apply(&self, body: &str) -> String {
        match self {
            Self::None => body.to_string(),
            Self::StripJsonp => strip_jsonp(body),
            Self::Custom(f) => f(body),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::StripJsonp => f.write_str("StripJsonp"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Removes a JSONP wrapper: everything up to the first `(` and any trailing
/// `)`/`;` characters. Bodies without a `(` are returned trimmed.
pub fn strip_jsonp(body: &str) -> String {
    let body = body.trim();

    match body.split_once('(') {
        Some((_, inner)) => inner
            .trim_end()
            .trim_end_matches([')', ';'])
            .trim()
            .to_string(),
        None => body.to_string(),
    }
}

/// Depth-first search for the first object member called `name`.
pub fn pluck<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(name)
            .or_else(|| map.values().find_map(|v| pluck(v, name))),
        Value::Array(items) => items.iter().find_map(|v| pluck(v, name)),
        _ => None,
    }
}
