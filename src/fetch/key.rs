//! Cache key derivation
//!
//! Turns a free-form URL plus query parameters into a stable, lower-case key
//! built only from alphanumerics and single `_` delimiters.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::cache::MAX_KEY_LENGTH;

/// Separator that replaces every run of non-alphanumeric characters.
pub const KEY_DELIMITER: char = '_';

/// Hex length of the SHA-256 suffix used by [`bound_key`].
const DIGEST_HEX_LEN: usize = 64;

/// Resolves `url` against an optional base.
///
/// Absolute URLs are returned unchanged. Relative ones are joined to the base
/// with exactly one `/`. A result without a scheme gets `https://`.
pub fn resolve_url(url: &str, base_url: Option<&str>) -> String {
    let url = url.trim();

    let joined = if has_scheme(url) {
        url.to_string()
    } else {
        match base_url.map(str::trim).filter(|b| !b.is_empty()) {
            Some(base) if url.is_empty() => base.to_string(),
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    };

    if has_scheme(&joined) {
        joined
    } else {
        format!("https://{}", joined.trim_start_matches('/'))
    }
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://")
        .map(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
        .unwrap_or(false)
}

/// Derives the cache key for a request.
///
/// The scheme is dropped, parameters are appended in name order, and the
/// whole string is folded with [`fold_key`]. Keys longer than
/// [`MAX_KEY_LENGTH`] are shortened with [`bound_key`].
pub fn derive_key(url: &str, base_url: Option<&str>, params: &BTreeMap<String, String>) -> String {
    let resolved = resolve_url(url, base_url);
    let without_scheme = resolved
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&resolved);

    let mut raw = without_scheme.to_string();
    if !params.is_empty() {
        let query: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        raw.push('?');
        raw.push_str(&query.join("&"));
    }

    bound_key(fold_key(&raw))
}

/// Shortens a folded key to at most [`MAX_KEY_LENGTH`] bytes.
///
/// Long keys become a prefix of the key, a delimiter and the hex SHA-256 of
/// the full key, so distinct long keys stay distinct.
pub fn bound_key(key: String) -> String {
    if key.len() <= MAX_KEY_LENGTH {
        return key;
    }

    let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
    let budget = MAX_KEY_LENGTH - DIGEST_HEX_LEN - 1;
    let cut = key
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= budget)
        .last()
        .unwrap_or(0);
    let prefix = key[..cut].trim_end_matches(KEY_DELIMITER);

    if prefix.is_empty() {
        digest
    } else {
        format!("{prefix}{KEY_DELIMITER}{digest}")
    }
}

/// Lower-cases `raw`, collapses each run of non-alphanumeric characters into a
/// single [`KEY_DELIMITER`] and strips delimiters from both ends.
pub fn fold_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_delimiter = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_delimiter && !key.is_empty() {
                key.push(KEY_DELIMITER);
            }
            pending_delimiter = false;
            key.extend(c.to_lowercase());
        } else {
            pending_delimiter = true;
        }
    }

    key
}
