//! Unit tests for the response cache helpers.
//!
//! Run with: cargo test --test cache_unit_test

use std::time::Duration;

use skycast::common::build_response_cache;
use skycast::routes::cache;

#[test]
fn cache_key_builds_correctly() {
    // Basic key building
    assert_eq!(cache::cache_key("weather", &[]), "weather");
    assert_eq!(
        cache::cache_key("weather", &["coords", "52.23", "21.01"]),
        "weather:coords:52.23:21.01"
    );

    // Empty components preserved (ensures query uniqueness)
    assert_ne!(
        cache::cache_key("forecast", &["coords", "", "21.01"]),
        cache::cache_key("forecast", &["coords", "21.01"])
    );
}

#[test]
fn query_fingerprint_is_stable_and_distinguishing() {
    let a = cache::query_fingerprint("Warszawa");
    let b = cache::query_fingerprint("Warszawa");
    let c = cache::query_fingerprint("Wrocław");

    assert_eq!(a, b);
    assert_ne!(a, c);

    // sha256 hex
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[tokio::test]
async fn cache_round_trip_returns_stored_value() {
    let cache_store = build_response_cache(1024 * 1024);

    let key = cache::cache_key("weather", &["756135"]);
    let value = br#"{"temp":18.4}"#.to_vec();

    cache::store_cached(
        &cache_store,
        key.clone(),
        value.clone(),
        Duration::from_secs(60),
    )
    .await;

    let hit = cache::get_cached(&cache_store, &key).await;
    assert_eq!(hit.as_deref(), Some(&value));
}

#[tokio::test]
async fn cache_entry_expires_after_its_own_ttl() {
    let cache_store = build_response_cache(1024 * 1024);

    cache::store_cached(
        &cache_store,
        "weather:1".to_string(),
        b"short".to_vec(),
        Duration::from_millis(100),
    )
    .await;
    cache::store_cached(
        &cache_store,
        "forecast:1".to_string(),
        b"long".to_vec(),
        Duration::from_secs(60),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    // The short-TTL entry lapses while its sibling stays resident
    assert!(cache::get_cached(&cache_store, "weather:1").await.is_none());
    assert!(cache::get_cached(&cache_store, "forecast:1").await.is_some());
}

#[tokio::test]
async fn cache_miss_on_unknown_key() {
    let cache_store = build_response_cache(1024 * 1024);
    assert!(cache::get_cached(&cache_store, "weather:999").await.is_none());
}
