//! Unit tests for the stored-sample freshness window.

use chrono::{Duration, Utc};

use skycast::routes::weather::is_fresh;

#[test]
fn sample_within_window_is_fresh() {
    let now = Utc::now();
    let created = now - Duration::minutes(10);

    assert!(is_fresh(created, now, 15));
}

#[test]
fn sample_past_window_is_stale() {
    let now = Utc::now();
    let created = now - Duration::minutes(20);

    assert!(!is_fresh(created, now, 15));
}

#[test]
fn sample_exactly_at_window_is_stale() {
    let now = Utc::now();
    let created = now - Duration::minutes(15);

    assert!(!is_fresh(created, now, 15));
}

#[test]
fn clock_skew_into_the_future_counts_as_fresh() {
    let now = Utc::now();
    let created = now + Duration::minutes(2);

    assert!(is_fresh(created, now, 15));
}
