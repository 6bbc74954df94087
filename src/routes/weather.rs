use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::time::Duration;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::{cities, weather_samples};
use crate::error::{AppError, AppResult};
use crate::openweather::models::CurrentObservation;
use crate::routes::{cache, resolve_or_create_city};
use crate::sync::worker;

/// Current-weather-by-id responses are re-cached for a short window both
/// when served from storage and after a live fetch.
const ID_LOOKUP_TTL_MINUTES: u64 = 5;

const DEFAULT_LANG: &str = "pl";

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LangQuery {
    /// Provider response language (default: pl)
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CoordsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Provider response language (default: pl)
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CityNameQuery {
    /// Free-text city name, min 2 characters
    pub q: Option<String>,
    /// Provider response language (default: pl)
    pub lang: Option<String>,
}

impl CoordsQuery {
    fn require(&self) -> AppResult<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(AppError::BadRequest(
                "lat and lon query parameters are required".to_string(),
            )),
        }
    }
}

impl CityNameQuery {
    fn require(&self) -> AppResult<&str> {
        match self.q.as_deref() {
            Some(q) if q.chars().count() >= 2 => Ok(q),
            _ => Err(AppError::BadRequest(
                "q query parameter is required (min 2 characters)".to_string(),
            )),
        }
    }
}

fn lang_of(lang: &Option<String>) -> &str {
    lang.as_deref().unwrap_or(DEFAULT_LANG)
}

/// Whether a stored sample is recent enough to serve instead of calling the
/// provider.
#[must_use]
pub fn is_fresh(created_at: DateTime<Utc>, now: DateTime<Utc>, max_age_minutes: u64) -> bool {
    let max_age = chrono::Duration::minutes(max_age_minutes.try_into().unwrap_or(i64::MAX));
    now.signed_duration_since(created_at) < max_age
}

/// Schedule a historical-store append off the request path.
///
/// At most once, best-effort, no retry: the response never waits on this,
/// and a failure is logged and lost.
fn spawn_sample_append(state: AppState, city_id: Uuid, observation: CurrentObservation) {
    tokio::spawn(async move {
        if let Err(e) =
            worker::record_sample(&state.db, city_id, &observation.report, observation.raw).await
        {
            tracing::warn!(city_id = %city_id, error = %e, "Failed to persist weather sample");
        }
    });
}

/// Current weather by provider city id
///
/// Serves from cache, then from a recent stored sample, then from the
/// provider (writing through to the cache and scheduling a history append).
#[utoipa::path(
    get,
    path = "/api/weather/{city_id}",
    params(
        ("city_id" = i64, Path, description = "OpenWeatherMap city id"),
        LangQuery
    ),
    responses(
        (status = 200, description = "Current conditions (raw provider payload)"),
        (status = 404, description = "City not found"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_current_weather(
    State(state): State<AppState>,
    Path(city_id): Path<i64>,
    Query(query): Query<LangQuery>,
) -> AppResult<Response> {
    let city = resolve_or_create_city(&state.db, &state.openweather, city_id).await?;

    let cache_key = cache::cache_key("weather", &[&city_id.to_string()]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    // A stored sample inside the freshness window short-circuits the provider
    let latest = weather_samples::Entity::find()
        .filter(weather_samples::Column::CityId.eq(city.id))
        .order_by_desc(weather_samples::Column::CreatedAt)
        .one(&state.db)
        .await?;

    if let Some(sample) = latest {
        let fresh = sample.created_at.is_some_and(|created| {
            is_fresh(
                created.with_timezone(&Utc),
                Utc::now(),
                state.config.weather_update_interval_minutes,
            )
        });

        if fresh && sample.payload.is_some() {
            tracing::debug!(city = %city.name, "Serving stored sample within freshness window");
            return cache::cache_and_respond(
                &state.response_cache,
                cache_key,
                &sample.payload,
                minutes(ID_LOOKUP_TTL_MINUTES),
            )
            .await;
        }
    }

    tracing::debug!(city = %city.name, "Fetching current weather from provider");
    let observation = state
        .openweather
        .current_by_id(city_id, lang_of(&query.lang))
        .await?;

    spawn_sample_append(state.clone(), city.id, observation.clone());

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &observation.raw,
        minutes(ID_LOOKUP_TTL_MINUTES),
    )
    .await
}

/// Current weather by coordinates
#[utoipa::path(
    get,
    path = "/api/weather/coordinates",
    params(CoordsQuery),
    responses(
        (status = 200, description = "Current conditions (raw provider payload)"),
        (status = 400, description = "Missing lat/lon"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_weather_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordsQuery>,
) -> AppResult<Response> {
    let (lat, lon) = query.require()?;

    let cache_key = cache::cache_key("weather", &["coords", &lat.to_string(), &lon.to_string()]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let observation = state
        .openweather
        .current_by_coords(lat, lon, lang_of(&query.lang))
        .await?;

    // The responding city is registered locally so its history can accumulate
    let city = worker::city_for_report(&state.db, &observation.report).await?;
    spawn_sample_append(state.clone(), city.id, observation.clone());

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &observation.raw,
        minutes(state.config.weather_cache_minutes),
    )
    .await
}

/// Current weather by city name query
#[utoipa::path(
    get,
    path = "/api/weather/city",
    params(CityNameQuery),
    responses(
        (status = 200, description = "Current conditions (raw provider payload)"),
        (status = 400, description = "Missing or too-short query"),
        (status = 404, description = "No matching city"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_weather_by_city(
    State(state): State<AppState>,
    Query(query): Query<CityNameQuery>,
) -> AppResult<Response> {
    let q = query.require()?;

    let cache_key = cache::cache_key("weather", &["query", &cache::query_fingerprint(q)]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let observation = state
        .openweather
        .current_by_query(q, lang_of(&query.lang))
        .await?;

    let city = worker::city_for_report(&state.db, &observation.report).await?;
    spawn_sample_append(state.clone(), city.id, observation.clone());

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &observation.raw,
        minutes(state.config.weather_cache_minutes),
    )
    .await
}

/// Forecast by provider city id
///
/// Forecasts are pure cache-or-fetch passthroughs: never persisted, and the
/// city must already be known locally.
#[utoipa::path(
    get,
    path = "/api/weather/forecast/{city_id}",
    params(
        ("city_id" = i64, Path, description = "OpenWeatherMap city id"),
        LangQuery
    ),
    responses(
        (status = 200, description = "Forecast (raw provider payload)"),
        (status = 404, description = "City not found"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(city_id): Path<i64>,
    Query(query): Query<LangQuery>,
) -> AppResult<Response> {
    let city = cities::Entity::find()
        .filter(cities::Column::OpenweatherId.eq(city_id))
        .one(&state.db)
        .await?;
    if city.is_none() {
        return Err(AppError::NotFound("City not found".to_string()));
    }

    let cache_key = cache::cache_key("forecast", &[&city_id.to_string()]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let forecast = state
        .openweather
        .forecast_by_id(city_id, lang_of(&query.lang))
        .await?;

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &forecast,
        minutes(state.config.forecast_cache_minutes),
    )
    .await
}

/// Forecast by coordinates
#[utoipa::path(
    get,
    path = "/api/weather/forecast/coordinates",
    params(CoordsQuery),
    responses(
        (status = 200, description = "Forecast (raw provider payload)"),
        (status = 400, description = "Missing lat/lon"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_forecast_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordsQuery>,
) -> AppResult<Response> {
    let (lat, lon) = query.require()?;

    let cache_key = cache::cache_key("forecast", &["coords", &lat.to_string(), &lon.to_string()]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let forecast = state
        .openweather
        .forecast_by_coords(lat, lon, lang_of(&query.lang))
        .await?;

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &forecast,
        minutes(state.config.forecast_cache_minutes),
    )
    .await
}

/// Forecast by city name query
#[utoipa::path(
    get,
    path = "/api/weather/forecast/city",
    params(CityNameQuery),
    responses(
        (status = 200, description = "Forecast (raw provider payload)"),
        (status = 400, description = "Missing or too-short query"),
        (status = 404, description = "No matching city"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "weather"
)]
pub async fn get_forecast_by_city(
    State(state): State<AppState>,
    Query(query): Query<CityNameQuery>,
) -> AppResult<Response> {
    let q = query.require()?;

    let cache_key = cache::cache_key("forecast", &["query", &cache::query_fingerprint(q)]);

    if let Some(cached) = cache::get_cached(&state.response_cache, &cache_key).await {
        return cache::json_response((*cached).to_vec(), true);
    }

    let forecast = state
        .openweather
        .forecast_by_query(q, lang_of(&query.lang))
        .await?;

    cache::cache_and_respond(
        &state.response_cache,
        cache_key,
        &forecast,
        minutes(state.config.forecast_cache_minutes),
    )
    .await
}
