//! Unit tests for favorites and search input policies.

use skycast::error::AppError;
use skycast::routes::cities::{ensure_favorite_capacity, validate_search_query, FAVORITES_LIMIT};

#[test]
fn capacity_allows_up_to_the_limit() {
    assert!(ensure_favorite_capacity(0).is_ok());
    assert!(ensure_favorite_capacity(FAVORITES_LIMIT - 1).is_ok());
}

#[test]
fn eleventh_favorite_is_rejected() {
    let result = ensure_favorite_capacity(FAVORITES_LIMIT);
    assert!(matches!(result, Err(AppError::LimitExceeded(_))));

    // Far past the cap behaves the same
    assert!(matches!(
        ensure_favorite_capacity(FAVORITES_LIMIT + 5),
        Err(AppError::LimitExceeded(_))
    ));
}

#[test]
fn short_search_queries_are_rejected() {
    assert!(matches!(
        validate_search_query(""),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        validate_search_query("ab"),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn search_query_length_counts_characters_not_bytes() {
    // Two characters, four bytes
    assert!(validate_search_query("łó").is_err());
    // Three characters clears the gate
    assert!(validate_search_query("łód").is_ok());
}

#[test]
fn valid_search_queries_pass() {
    assert!(validate_search_query("War").is_ok());
    assert!(validate_search_query("Warszawa").is_ok());
}
