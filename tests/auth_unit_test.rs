//! Unit tests for password hashing, token minting, and bearer parsing.

use skycast::auth::{hash_password, mint_token, parse_bearer, token_digest, verify_password};

#[test]
fn password_round_trip_verifies() {
    let hash = hash_password("correct horse battery staple").expect("hashing should succeed");

    assert!(verify_password("correct horse battery staple", &hash));
    assert!(!verify_password("wrong password", &hash));
}

#[test]
fn distinct_hashes_for_the_same_password() {
    // Fresh salt per hash
    let a = hash_password("hunter2").expect("hashing should succeed");
    let b = hash_password("hunter2").expect("hashing should succeed");

    assert_ne!(a, b);
    assert!(verify_password("hunter2", &a));
    assert!(verify_password("hunter2", &b));
}

#[test]
fn unparseable_stored_hash_is_a_mismatch() {
    assert!(!verify_password("anything", "not-a-phc-string"));
    assert!(!verify_password("anything", ""));
}

#[test]
fn minted_tokens_are_opaque_alphanumerics() {
    let token = mint_token();

    assert_eq!(token.len(), 48);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

    // Practically unique
    assert_ne!(token, mint_token());
}

#[test]
fn token_digest_is_deterministic_sha256_hex() {
    let a = token_digest("abc123");
    let b = token_digest("abc123");
    let c = token_digest("abc124");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn bearer_header_parsing() {
    assert_eq!(parse_bearer(Some("Bearer abc123")), Some("abc123"));
    assert_eq!(parse_bearer(Some("Bearer   spaced  ")), Some("spaced"));

    assert_eq!(parse_bearer(None), None);
    assert_eq!(parse_bearer(Some("abc123")), None);
    assert_eq!(parse_bearer(Some("Basic abc123")), None);
    assert_eq!(parse_bearer(Some("Bearer ")), None);
}
