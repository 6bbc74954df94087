use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::entity::{cities, user_cities, weather_samples};
use crate::error::AppResult;
use crate::openweather::models::CurrentWeather;
use crate::openweather::OpenWeatherClient;

/// Pause after every upstream call made by the refresh job and the seeder,
/// success or failure. A courtesy bound on request rate, not a retry or
/// backoff mechanism.
const INTER_CITY_PAUSE: Duration = Duration::from_secs(1);

/// Outcome tally of one refresh run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshSummary {
    pub updated: u32,
    pub failed: u32,
}

/// Refresh current weather for every city held in any user's favorites.
///
/// When no favorites exist yet, the configured default cities are seeded
/// first; if the favorites set is still empty afterwards the default cities
/// themselves are refreshed so their history starts accumulating.
///
/// Cities are processed strictly sequentially with a fixed pause after each
/// one. A per-city failure is counted and skipped, never propagated; the
/// next scheduled run retries naturally.
///
/// # Errors
///
/// Returns an error only if the favorites set itself cannot be read.
pub async fn refresh_weather(
    db: &DatabaseConnection,
    client: &OpenWeatherClient,
    config: &Config,
) -> AppResult<RefreshSummary> {
    let mut targets = favorited_cities(db).await?;

    if targets.is_empty() {
        tracing::info!("No favorite cities; seeding default city list");
        seed_default_cities(db, client, &config.default_city_ids).await;

        targets = favorited_cities(db).await?;
        if targets.is_empty() {
            targets = cities::Entity::find()
                .filter(cities::Column::OpenweatherId.is_in(config.default_city_ids.clone()))
                .all(db)
                .await?;
        }
    }

    if targets.is_empty() {
        tracing::info!("No cities to refresh");
        return Ok(RefreshSummary::default());
    }

    tracing::info!(city_count = targets.len(), "Refreshing weather data");

    let mut summary = RefreshSummary::default();

    for city in &targets {
        match client.current_by_id(city.openweather_id, "pl").await {
            Ok(observation) => {
                match record_sample(db, city.id, &observation.report, observation.raw).await {
                    Ok(()) => {
                        summary.updated += 1;
                        tracing::debug!(city = %city.name, "Refreshed weather");
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::warn!(city = %city.name, error = %e, "Failed to store sample");
                    }
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    city = %city.name,
                    openweather_id = city.openweather_id,
                    error = %e,
                    "Failed to fetch weather"
                );
            }
        }

        tokio::time::sleep(INTER_CITY_PAUSE).await;
    }

    Ok(summary)
}

/// Distinct cities currently held in any user's favorites.
async fn favorited_cities(db: &DatabaseConnection) -> AppResult<Vec<cities::Model>> {
    let favorited: HashSet<Uuid> = user_cities::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.city_id)
        .collect();

    if favorited.is_empty() {
        return Ok(Vec::new());
    }

    cities::Entity::find()
        .filter(cities::Column::Id.is_in(favorited.into_iter().collect::<Vec<_>>()))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Create City rows for any configured default city ids not yet present.
/// Failures are logged per city and never interrupt the remaining seeds.
pub async fn seed_default_cities(
    db: &DatabaseConnection,
    client: &OpenWeatherClient,
    default_city_ids: &[i64],
) {
    for &openweather_id in default_city_ids {
        let exists = cities::Entity::find()
            .filter(cities::Column::OpenweatherId.eq(openweather_id))
            .one(db)
            .await;

        match exists {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(openweather_id, error = %e, "Failed to check default city");
                continue;
            }
        }

        match client.current_by_id(openweather_id, "pl").await {
            Ok(observation) => match city_for_report(db, &observation.report).await {
                Ok(city) => tracing::info!(city = %city.name, "Seeded default city"),
                Err(e) => {
                    tracing::warn!(openweather_id, error = %e, "Failed to create default city");
                }
            },
            Err(e) => {
                tracing::warn!(openweather_id, error = %e, "Failed to fetch default city");
            }
        }

        tokio::time::sleep(INTER_CITY_PAUSE).await;
    }
}

/// Look up the city a report belongs to, creating the row on first
/// reference. Creation is unguarded against concurrent callers; the unique
/// index on the provider id rejects the losing insert.
///
/// # Errors
///
/// Returns `AppError::Database` if the lookup or insert fails.
pub async fn city_for_report(
    db: &DatabaseConnection,
    report: &CurrentWeather,
) -> AppResult<cities::Model> {
    if let Some(city) = cities::Entity::find()
        .filter(cities::Column::OpenweatherId.eq(report.id))
        .one(db)
        .await?
    {
        return Ok(city);
    }

    let city = cities::ActiveModel {
        id: Set(Uuid::new_v4()),
        openweather_id: Set(report.id),
        name: Set(report.name.clone()),
        country: Set(report.sys.country.clone()),
        latitude: Set(report.coord.lat),
        longitude: Set(report.coord.lon),
        created_at: Set(Some(Utc::now().into())),
    };
    let city = city.insert(db).await?;

    tracing::info!(city = %city.name, openweather_id = city.openweather_id, "Created city");
    Ok(city)
}

/// Append one weather sample for a city.
///
/// # Errors
///
/// Returns `AppError::Database` if the insert fails.
pub async fn record_sample(
    db: &DatabaseConnection,
    city_id: Uuid,
    report: &CurrentWeather,
    raw: serde_json::Value,
) -> AppResult<()> {
    sample_from_report(city_id, report, raw).insert(db).await?;
    Ok(())
}

/// Map a provider report onto a historical sample row. Timestamps arrive as
/// epoch seconds; an unparseable one falls back to now.
#[must_use]
pub fn sample_from_report(
    city_id: Uuid,
    report: &CurrentWeather,
    raw: serde_json::Value,
) -> weather_samples::ActiveModel {
    let condition = report.condition();

    weather_samples::ActiveModel {
        id: Set(Uuid::new_v4()),
        city_id: Set(city_id),
        temperature: Set(report.main.temp),
        feels_like: Set(report.main.feels_like),
        humidity: Set(report.main.humidity),
        pressure: Set(report.main.pressure),
        wind_speed: Set(report.wind.speed),
        wind_direction: Set(report.wind.deg),
        weather_condition: Set(condition.map(|c| c.main.clone()).unwrap_or_default()),
        weather_description: Set(condition.map(|c| c.description.clone()).unwrap_or_default()),
        weather_icon: Set(condition.map(|c| c.icon.clone()).unwrap_or_default()),
        clouds: Set(report.clouds.all),
        visibility: Set(report.visibility),
        sunrise: Set(epoch_to_datetime(report.sys.sunrise)),
        sunset: Set(epoch_to_datetime(report.sys.sunset)),
        measured_at: Set(epoch_to_datetime(report.dt)),
        payload: Set(Some(raw)),
        created_at: Set(Some(Utc::now().into())),
    }
}

fn epoch_to_datetime(epoch_seconds: i64) -> sea_orm::prelude::DateTimeWithTimeZone {
    chrono::DateTime::from_timestamp(epoch_seconds, 0)
        .unwrap_or_else(Utc::now)
        .into()
}
