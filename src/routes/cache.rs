//! Response caching for provider-backed endpoints.
//!
//! Entries are short-lived, keyed by request kind plus identifying
//! components, and carry their own TTL (5 minutes for id lookups, the
//! configured weather/forecast TTLs otherwise). There is no invalidation
//! beyond expiry: a refresh job update and a handler write may race, and the
//! most recent write simply wins until its TTL lapses.
//!
//! ```text
//! // In an endpoint handler:
//! let key = cache::cache_key("weather", &["coords", &lat, &lon]);
//!
//! if let Some(cached) = cache::get_cached(&state.response_cache, &key).await {
//!     return cache::json_response((*cached).to_vec(), true);
//! }
//!
//! // ... fetch from the provider ...
//!
//! cache::cache_and_respond(&state.response_cache, key, &payload, ttl).await
//! ```

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{CachedResponse, ResponseCache};
use crate::error::{AppError, AppResult};

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:` separator. Empty components are included
/// to ensure different queries produce different keys.
#[must_use]
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

/// Fingerprint for free-text query components. Keeps arbitrary user input
/// out of key strings while still distinguishing queries.
#[must_use]
pub fn query_fingerprint(query: &str) -> String {
    let digest = Sha256::digest(query.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Try to get a cached response.
///
/// Returns `Some(data)` on a hit; `None` means miss or expired and the
/// caller should fetch fresh data.
pub async fn get_cached(cache: &ResponseCache, cache_key: &str) -> Option<Arc<Vec<u8>>> {
    let cached = cache.get(cache_key).await?;
    tracing::debug!(cache_key = %cache_key, "cache_hit");
    Some(cached.data)
}

/// Store a response in cache with the given TTL.
pub async fn store_cached(cache: &ResponseCache, cache_key: String, data: Vec<u8>, ttl: Duration) {
    let size = data.len();
    cache
        .insert(
            cache_key.clone(),
            CachedResponse {
                data: Arc::new(data),
                ttl,
            },
        )
        .await;

    tracing::debug!(
        cache_key = %cache_key,
        size_bytes = size,
        ttl_secs = ttl.as_secs(),
        "cache_stored"
    );
}

/// Build a JSON response with an X-Cache header indicating hit/miss status.
///
/// # Errors
///
/// Returns `AppError::Internal` if the response cannot be built.
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize a response, store it in cache with the given TTL, and return it.
///
/// # Errors
///
/// Returns `AppError::Internal` if serialization or response building fails.
pub async fn cache_and_respond<T: Serialize>(
    cache: &ResponseCache,
    cache_key: String,
    response: &T,
    ttl: Duration,
) -> AppResult<Response> {
    let json_bytes =
        serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    store_cached(cache, cache_key, json_bytes.clone(), ttl).await;

    json_response(json_bytes, false)
}
