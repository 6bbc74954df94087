use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::openweather::models::{CurrentObservation, CurrentWeather, GeoPlace};

/// Per-request bound on current-weather and forecast lookups. Geocoding and
/// reverse id resolution run with the client default.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

pub struct OpenWeatherClient {
    http_client: Client,
    base_url: String,
    geo_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.openweather_base_url.clone(),
            geo_url: config.openweather_geo_url.clone(),
            api_key: config.openweather_api_key.clone(),
        }
    }

    /// Current conditions by provider city id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the provider has no such city, or
    /// `AppError::OpenWeatherApi` on any other failure.
    pub async fn current_by_id(&self, city_id: i64, lang: &str) -> AppResult<CurrentObservation> {
        self.fetch_current(&[("id", city_id.to_string())], lang)
            .await
    }

    /// Current conditions by coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::OpenWeatherApi` if the request fails.
    pub async fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        lang: &str,
    ) -> AppResult<CurrentObservation> {
        self.fetch_current(&[("lat", lat.to_string()), ("lon", lon.to_string())], lang)
            .await
    }

    /// Current conditions by free-text city name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if nothing matches the query, or
    /// `AppError::OpenWeatherApi` on any other failure.
    pub async fn current_by_query(&self, query: &str, lang: &str) -> AppResult<CurrentObservation> {
        self.fetch_current(&[("q", query.to_string())], lang).await
    }

    /// Forecast by provider city id. The response is passed through opaquely.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::OpenWeatherApi` as above.
    pub async fn forecast_by_id(&self, city_id: i64, lang: &str) -> AppResult<serde_json::Value> {
        self.fetch_forecast(&[("id", city_id.to_string())], lang)
            .await
    }

    /// Forecast by coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::OpenWeatherApi` if the request fails.
    pub async fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        lang: &str,
    ) -> AppResult<serde_json::Value> {
        self.fetch_forecast(&[("lat", lat.to_string()), ("lon", lon.to_string())], lang)
            .await
    }

    /// Forecast by free-text city name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::OpenWeatherApi` as above.
    pub async fn forecast_by_query(&self, query: &str, lang: &str) -> AppResult<serde_json::Value> {
        self.fetch_forecast(&[("q", query.to_string())], lang).await
    }

    /// Geocoding search: up to `limit` places matching a name query.
    ///
    /// # Errors
    ///
    /// Returns `AppError::OpenWeatherApi` if the request fails or the
    /// response cannot be parsed.
    pub async fn geocode(&self, query: &str, limit: u8) -> AppResult<Vec<GeoPlace>> {
        let url = format!("{}/direct", self.geo_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("limit", limit.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::OpenWeatherApi(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::OpenWeatherApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OpenWeatherApi(format!("Failed to parse response: {e}")))
    }

    /// Resolve the provider city id covering the given coordinates via a
    /// reverse current-weather lookup. Geocoding hits whose id cannot be
    /// resolved are dropped by the caller, so every failure maps to `None`.
    pub async fn city_id_at(&self, lat: f64, lon: f64) -> Option<i64> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(lat, lon, status = %r.status(), "City id lookup failed");
                return None;
            }
            Err(e) => {
                tracing::warn!(lat, lon, error = %e, "City id lookup failed");
                return None;
            }
        };

        match response.json::<serde_json::Value>().await {
            Ok(body) => body.get("id").and_then(serde_json::Value::as_i64),
            Err(e) => {
                tracing::warn!(lat, lon, error = %e, "City id lookup returned unparseable body");
                None
            }
        }
    }

    async fn fetch_current(
        &self,
        params: &[(&str, String)],
        lang: &str,
    ) -> AppResult<CurrentObservation> {
        let url = format!("{}/weather", self.base_url);
        let raw = self.fetch_json(&url, params, lang).await?;

        let report: CurrentWeather = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::OpenWeatherApi(format!("Failed to parse response: {e}")))?;

        Ok(CurrentObservation { report, raw })
    }

    async fn fetch_forecast(
        &self,
        params: &[(&str, String)],
        lang: &str,
    ) -> AppResult<serde_json::Value> {
        let url = format!("{}/forecast", self.base_url);
        self.fetch_json(&url, params, lang).await
    }

    async fn fetch_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        lang: &str,
    ) -> AppResult<serde_json::Value> {
        let response = self
            .http_client
            .get(url)
            .timeout(LOOKUP_TIMEOUT)
            .query(params)
            .query(&[
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", lang),
            ])
            .send()
            .await
            .map_err(|e| AppError::OpenWeatherApi(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("City not found".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::OpenWeatherApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::OpenWeatherApi(format!("Failed to parse response: {e}")))
    }
}
