use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::common::AppState;
use crate::sync::worker;

/// Run the weather refresh job on a schedule.
///
/// The first run starts immediately; afterwards the job fires every
/// configured interval. Each run is awaited before the next tick and a run
/// that outlasts the interval delays the next one instead of bursting, so
/// at most one refresh is ever in flight.
pub async fn run_weather_refresh(state: AppState) {
    let interval_minutes = state.config.weather_update_interval_minutes;

    tracing::info!(interval_minutes, "Starting weather refresh scheduler");

    let mut ticker = interval(Duration::from_secs(interval_minutes * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        tracing::debug!("Running weather refresh...");

        match worker::refresh_weather(&state.db, &state.openweather, &state.config).await {
            Ok(summary) => {
                tracing::info!(
                    updated = summary.updated,
                    failed = summary.failed,
                    "Weather refresh completed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Weather refresh failed");
            }
        }
    }
}
