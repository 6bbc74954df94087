pub mod auth;
pub mod cache;
pub mod cities;
pub mod health;
mod rate_limit;
pub mod weather;

use axum::{
    routing::{delete, get, post},
    Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use rate_limit::FallbackIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::entity::cities as city_entity;
use crate::error::{AppError, AppResult};
use crate::openweather::OpenWeatherClient;
use crate::sync::worker;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Resolve a city by provider id, creating the local row on first reference.
///
/// On a local miss the provider is asked for current conditions at that id
/// and the city metadata is extracted from the response. First-reference
/// creation is unguarded: two concurrent callers can both attempt the
/// insert, and the unique index on the provider id makes the loser surface
/// a database error.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the provider has no such city, or the
/// underlying provider/database error.
pub async fn resolve_or_create_city(
    db: &DatabaseConnection,
    client: &OpenWeatherClient,
    openweather_id: i64,
) -> AppResult<city_entity::Model> {
    if let Some(city) = city_entity::Entity::find()
        .filter(city_entity::Column::OpenweatherId.eq(openweather_id))
        .one(db)
        .await?
    {
        return Ok(city);
    }

    let observation = client
        .current_by_id(openweather_id, "pl")
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("City not found".to_string()),
            other => other,
        })?;

    worker::city_for_report(db, &observation.report).await
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        weather::get_current_weather,
        weather::get_weather_by_coordinates,
        weather::get_weather_by_city,
        weather::get_forecast,
        weather::get_forecast_by_coordinates,
        weather::get_forecast_by_city,
        cities::list_cities,
        cities::get_user_cities,
        cities::add_city,
        cities::remove_city,
        cities::search_cities,
        cities::get_historical_data,
    ),
    components(
        schemas(
            MessageResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserResponse,
            auth::AuthResponse,
            cities::CityResponse,
            cities::FavoriteCityResponse,
            cities::AddCityRequest,
            cities::AddCityResponse,
            cities::SearchResult,
            cities::HistoricalCity,
            cities::HistoricalPoint,
            cities::HistoricalResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login, and token revocation"),
        (name = "weather", description = "Current conditions and forecasts"),
        (name = "cities", description = "Favorites, discovery, search, and history"),
    ),
    info(
        title = "Skycast API",
        description = "Favorites-based weather dashboard API backed by OpenWeatherMap",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            metadata_rate = %format!("{}/s burst {}", config.rate_limit_metadata_per_second, config.rate_limit_metadata_burst),
            weather_rate = %format!("{}/s burst {}", config.rate_limit_data_per_second, config.rate_limit_data_burst),
            "Rate limiting configured"
        );
    }

    // Base routes without rate limiting
    let metadata_routes_base = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::me))
        .route(
            "/cities",
            get(cities::list_cities).post(cities::add_city),
        )
        .route("/cities/search", get(cities::search_cities))
        .route("/cities/user", get(cities::get_user_cities))
        .route("/cities/{city_id}", delete(cities::remove_city))
        .route(
            "/cities/{city_id}/historical",
            get(cities::get_historical_data),
        );

    // Provider-backed routes get their own, stricter bucket
    let weather_routes_base = Router::new()
        .route("/weather/{city_id}", get(weather::get_current_weather))
        .route(
            "/weather/coordinates",
            get(weather::get_weather_by_coordinates),
        )
        .route("/weather/city", get(weather::get_weather_by_city))
        .route("/weather/forecast/{city_id}", get(weather::get_forecast))
        .route(
            "/weather/forecast/coordinates",
            get(weather::get_forecast_by_coordinates),
        )
        .route(
            "/weather/forecast/city",
            get(weather::get_forecast_by_city),
        );

    // Combine API routes, conditionally applying rate limiting
    let api_routes = if config.disable_rate_limiting {
        Router::new()
            .merge(metadata_routes_base)
            .merge(weather_routes_base)
    } else {
        let metadata_limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_metadata_per_second)
            .burst_size(config.rate_limit_metadata_burst)
            .finish()
            .expect("Failed to create metadata rate limiter");

        let weather_limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_data_per_second)
            .burst_size(config.rate_limit_data_burst)
            .finish()
            .expect("Failed to create weather rate limiter");

        Router::new()
            .merge(metadata_routes_base.layer(GovernorLayer {
                config: Arc::new(metadata_limiter),
            }))
            .merge(weather_routes_base.layer(GovernorLayer {
                config: Arc::new(weather_limiter),
            }))
    }
    .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Combine all routes
    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
