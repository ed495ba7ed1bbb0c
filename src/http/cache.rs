//! HTTP cache control module
//!
//! Content-derived `ETag`s and `If-None-Match` evaluation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Stored files are immutable once written, an hour of caching is safe
pub const CACHE_CONTROL: &str = "public, max-age=3600";

/// Strong `ETag` built from the length and a hash of the content, e.g. `"1f4-9a3c..."`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// Whether `If-None-Match` covers `etag` (weak comparison, so `W/` prefixes match too)
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    let Some(header) = if_none_match else {
        return false;
    };

    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}
