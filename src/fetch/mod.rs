//! Fetch Module
//!
//! Cache-aware HTTP fetching: key derivation, response transforms and the
//! fetcher that ties them to the store.

mod fetcher;
pub mod key;
mod request;
mod transform;

pub use fetcher::{FetchStats, Fetcher};
pub use key::{bound_key, derive_key, fold_key, resolve_url};
pub use request::{FetchRequest, Payload};
pub use transform::{pluck, strip_jsonp, Transform};
