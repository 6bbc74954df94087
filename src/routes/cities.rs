use axum::{
    extract::{Path, Query, State},
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::common::AppState;
use crate::entity::{cities, user_cities, weather_samples};
use crate::error::{AppError, AppResult};
use crate::routes::{resolve_or_create_city, MessageResponse};
use crate::sync::worker;

/// Maximum number of cities a user can hold in favorites.
pub const FAVORITES_LIMIT: u64 = 10;

/// Minimum length for geocoding search queries.
const SEARCH_QUERY_MIN_CHARS: usize = 3;

/// Maximum number of geocoding results returned.
const SEARCH_RESULT_LIMIT: u8 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct CityResponse {
    pub id: Uuid,
    pub openweather_id: i64,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<cities::Model> for CityResponse {
    fn from(city: cities::Model) -> Self {
        Self {
            id: city.id,
            openweather_id: city.openweather_id,
            name: city.name,
            country: city.country,
            latitude: city.latitude,
            longitude: city.longitude,
        }
    }
}

/// A favorite city annotated with its most recent stored conditions
/// (null when no sample exists yet).
#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteCityResponse {
    pub id: Uuid,
    pub openweather_id: i64,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current_temp: Option<f64>,
    pub current_condition: Option<String>,
    pub current_icon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCityRequest {
    /// OpenWeatherMap city id
    pub city_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddCityResponse {
    pub message: String,
    pub city: CityResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Free-text city name, min 3 characters
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResult {
    /// OpenWeatherMap city id resolved from the hit's coordinates
    pub id: i64,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoricalQuery {
    /// Response format: json (default) or csv
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoricalCity {
    pub id: Uuid,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoricalPoint {
    /// Measurement time in epoch milliseconds (for JavaScript Date)
    pub timestamp: i64,
    pub date: String,
    pub temperature: f64,
    pub humidity: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub weather_condition: String,
    pub weather_icon: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoricalResponse {
    pub city: HistoricalCity,
    pub data: Vec<HistoricalPoint>,
}

/// Favorites cap policy: adding beyond the limit is rejected without any
/// state change.
///
/// # Errors
///
/// Returns `AppError::LimitExceeded` when the cap is already reached.
pub fn ensure_favorite_capacity(current_count: u64) -> AppResult<()> {
    if current_count >= FAVORITES_LIMIT {
        return Err(AppError::LimitExceeded(format!(
            "Favorites are limited to {FAVORITES_LIMIT} cities"
        )));
    }
    Ok(())
}

/// Search query length gate, checked before any provider call.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for queries shorter than 3 characters.
pub fn validate_search_query(query: &str) -> AppResult<()> {
    if query.chars().count() < SEARCH_QUERY_MIN_CHARS {
        return Err(AppError::BadRequest(format!(
            "Search query must be at least {SEARCH_QUERY_MIN_CHARS} characters"
        )));
    }
    Ok(())
}

async fn find_city_by_openweather_id(
    state: &AppState,
    openweather_id: i64,
) -> AppResult<cities::Model> {
    cities::Entity::find()
        .filter(cities::Column::OpenweatherId.eq(openweather_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))
}

async fn unfavorited_cities(state: &AppState) -> AppResult<Vec<cities::Model>> {
    let favorited: HashSet<Uuid> = user_cities::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|link| link.city_id)
        .collect();

    let mut query = cities::Entity::find();
    if !favorited.is_empty() {
        query = query.filter(cities::Column::Id.is_not_in(favorited.into_iter().collect::<Vec<_>>()));
    }

    query
        .order_by_asc(cities::Column::Name)
        .all(&state.db)
        .await
        .map_err(Into::into)
}

/// Discovery pool: cities not yet favorited by anyone
///
/// Seeds the configured default cities when the pool would otherwise be
/// empty.
#[utoipa::path(
    get,
    path = "/api/cities",
    responses(
        (status = 200, description = "Cities retrieved successfully", body = Vec<CityResponse>),
    ),
    tag = "cities"
)]
pub async fn list_cities(State(state): State<AppState>) -> AppResult<Json<Vec<CityResponse>>> {
    let mut pool = unfavorited_cities(&state).await?;

    if pool.is_empty() {
        worker::seed_default_cities(
            &state.db,
            &state.openweather,
            &state.config.default_city_ids,
        )
        .await;
        pool = unfavorited_cities(&state).await?;
    }

    Ok(Json(pool.into_iter().map(Into::into).collect()))
}

/// The caller's favorite cities with their latest stored conditions
#[utoipa::path(
    get,
    path = "/api/cities/user",
    responses(
        (status = 200, description = "Favorites retrieved successfully", body = Vec<FavoriteCityResponse>),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_token" = [])),
    tag = "cities"
)]
pub async fn get_user_cities(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<FavoriteCityResponse>>> {
    let favorites = user.find_related(cities::Entity).all(&state.db).await?;

    let mut response = Vec::with_capacity(favorites.len());
    for city in favorites {
        // Latest sample, if the refresh job has produced one yet
        let latest = weather_samples::Entity::find()
            .filter(weather_samples::Column::CityId.eq(city.id))
            .order_by_desc(weather_samples::Column::CreatedAt)
            .one(&state.db)
            .await?;

        response.push(FavoriteCityResponse {
            id: city.id,
            openweather_id: city.openweather_id,
            name: city.name,
            country: city.country,
            latitude: city.latitude,
            longitude: city.longitude,
            current_temp: latest.as_ref().map(|s| s.temperature),
            current_condition: latest.as_ref().map(|s| s.weather_condition.clone()),
            current_icon: latest.as_ref().map(|s| s.weather_icon.clone()),
        });
    }

    Ok(Json(response))
}

/// Add a city to the caller's favorites (max 10)
#[utoipa::path(
    post,
    path = "/api/cities",
    request_body = AddCityRequest,
    responses(
        (status = 200, description = "City added to favorites", body = AddCityResponse),
        (status = 400, description = "Limit reached or already a favorite"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "City not found"),
    ),
    security(("bearer_token" = [])),
    tag = "cities"
)]
pub async fn add_city(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AddCityRequest>,
) -> AppResult<Json<AddCityResponse>> {
    let count = user_cities::Entity::find()
        .filter(user_cities::Column::UserId.eq(user.id))
        .count(&state.db)
        .await?;
    ensure_favorite_capacity(count)?;

    let city = resolve_or_create_city(&state.db, &state.openweather, req.city_id).await?;

    let existing = user_cities::Entity::find_by_id((user.id, city.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "City is already in favorites".to_string(),
        ));
    }

    let link = user_cities::ActiveModel {
        user_id: Set(user.id),
        city_id: Set(city.id),
        created_at: Set(Some(Utc::now().into())),
    };
    link.insert(&state.db).await?;

    tracing::info!(user = %user.email, city = %city.name, "Added favorite");

    Ok(Json(AddCityResponse {
        message: "City added to favorites".to_string(),
        city: city.into(),
    }))
}

/// Remove a city from the caller's favorites
///
/// A non-default city left with no favoriting users is deleted along with
/// its full weather history.
#[utoipa::path(
    delete,
    path = "/api/cities/{city_id}",
    params(
        ("city_id" = i64, Path, description = "OpenWeatherMap city id"),
    ),
    responses(
        (status = 200, description = "City removed from favorites", body = MessageResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "City not found"),
    ),
    security(("bearer_token" = [])),
    tag = "cities"
)]
pub async fn remove_city(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(city_id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let city = find_city_by_openweather_id(&state, city_id).await?;

    user_cities::Entity::delete_by_id((user.id, city.id))
        .exec(&state.db)
        .await?;

    let is_default = state.config.default_city_ids.contains(&city.openweather_id);
    if !is_default {
        let still_favorited = user_cities::Entity::find()
            .filter(user_cities::Column::CityId.eq(city.id))
            .count(&state.db)
            .await?
            > 0;

        if !still_favorited {
            weather_samples::Entity::delete_many()
                .filter(weather_samples::Column::CityId.eq(city.id))
                .exec(&state.db)
                .await?;
            let name = city.name.clone();
            city.delete(&state.db).await?;
            tracing::info!(city = %name, "Deleted orphaned city and its history");
        }
    }

    Ok(Json(MessageResponse {
        message: "City removed from favorites".to_string(),
    }))
}

/// Geocoding search (min 3 characters, max 5 results)
///
/// Hits whose provider city id cannot be resolved from their coordinates
/// are dropped from the result set.
#[utoipa::path(
    get,
    path = "/api/cities/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching places", body = Vec<SearchResult>),
        (status = 400, description = "Query too short"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "cities"
)]
pub async fn search_cities(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<SearchResult>>> {
    let q = query.q.as_deref().unwrap_or_default();
    validate_search_query(q)?;

    let places = state.openweather.geocode(q, SEARCH_RESULT_LIMIT).await?;

    let mut results = Vec::with_capacity(places.len());
    for place in places {
        let Some(id) = state.openweather.city_id_at(place.lat, place.lon).await else {
            continue;
        };
        results.push(SearchResult {
            id,
            name: place.name,
            country: place.country,
            state: place.state,
            lat: place.lat,
            lon: place.lon,
        });
    }

    Ok(Json(results))
}

fn determine_format(query_format: &str, headers: &HeaderMap) -> String {
    // Query parameter takes precedence
    if query_format != "json" {
        return query_format.to_lowercase();
    }

    if let Some(accept) = headers.get(header::ACCEPT) {
        if let Ok(accept_str) = accept.to_str() {
            if accept_str.contains("text/csv") {
                return "csv".to_string();
            }
        }
    }

    "json".to_string()
}

fn build_csv_response(points: &[HistoricalPoint]) -> AppResult<Response> {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(100);

    let points = points.to_vec();

    tokio::spawn(async move {
        let header_row =
            "date,temperature,humidity,pressure,wind_speed,weather_condition,weather_icon\n"
                .to_string();
        let _ = tx.send(Ok(header_row)).await;

        for point in &points {
            let row = format!(
                "{},{},{},{},{},{},{}\n",
                point.date,
                point.temperature,
                point.humidity,
                point.pressure,
                point.wind_speed,
                point.weather_condition,
                point.weather_icon
            );
            if tx.send(Ok(row)).await.is_err() {
                break;
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Historical time series for a favorited city
///
/// Access requires the caller to hold the city in favorites. Supports JSON
/// (default) and CSV export.
#[utoipa::path(
    get,
    path = "/api/cities/{city_id}/historical",
    params(
        ("city_id" = i64, Path, description = "OpenWeatherMap city id"),
        HistoricalQuery
    ),
    responses(
        (status = 200, description = "Time series retrieved successfully", body = HistoricalResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "City is not in the caller's favorites"),
        (status = 404, description = "City not found"),
    ),
    security(("bearer_token" = [])),
    tag = "cities"
)]
pub async fn get_historical_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(city_id): Path<i64>,
    Query(query): Query<HistoricalQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let city = find_city_by_openweather_id(&state, city_id).await?;

    let is_favorite = user_cities::Entity::find_by_id((user.id, city.id))
        .one(&state.db)
        .await?
        .is_some();
    if !is_favorite {
        return Err(AppError::Forbidden(
            "No access to historical data for this city".to_string(),
        ));
    }

    let samples = weather_samples::Entity::find()
        .filter(weather_samples::Column::CityId.eq(city.id))
        .order_by_asc(weather_samples::Column::MeasuredAt)
        .all(&state.db)
        .await?;

    let data: Vec<HistoricalPoint> = samples
        .into_iter()
        .map(|sample| {
            let measured = sample.measured_at.with_timezone(&Utc);
            HistoricalPoint {
                timestamp: measured.timestamp_millis(),
                date: measured.format("%Y-%m-%d %H:%M:%S").to_string(),
                temperature: sample.temperature,
                humidity: sample.humidity,
                pressure: sample.pressure,
                wind_speed: sample.wind_speed,
                weather_condition: sample.weather_condition,
                weather_icon: sample.weather_icon,
            }
        })
        .collect();

    if determine_format(&query.format, &headers) == "csv" {
        return build_csv_response(&data);
    }

    Ok(Json(HistoricalResponse {
        city: HistoricalCity {
            id: city.id,
            name: city.name,
            country: city.country,
        },
        data,
    })
    .into_response())
}
