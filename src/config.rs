use std::env;

/// OpenWeatherMap ids of the ten Polish cities seeded when no favorites exist:
/// Warszawa, Łódź, Wrocław, Poznań, Gdańsk, Szczecin, Bydgoszcz, Lublin,
/// Katowice, Białystok.
pub const DEFAULT_CITY_IDS: [i64; 10] = [
    756_135, 3_094_802, 3_081_368, 3_088_171, 3_099_434, 3_093_133, 3_096_472, 765_876, 3_085_128,
    759_734,
];

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // OpenWeatherMap API
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_geo_url: String,

    // Refresh & freshness
    /// Refresh job period. Also the freshness window: a stored sample younger
    /// than this is served instead of calling the provider.
    pub weather_update_interval_minutes: u64,

    // Cache TTLs
    pub weather_cache_minutes: u64,
    pub forecast_cache_minutes: u64,

    // Seeded when no user holds any favorite
    pub default_city_ids: Vec<i64>,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_metadata_per_second: u64,
    pub rate_limit_metadata_burst: u32,
    pub rate_limit_data_per_second: u64,
    pub rate_limit_data_burst: u32,

    // Caching
    pub cache_max_bytes: u64,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // OpenWeatherMap API
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .map_err(|_| ConfigError::Missing("OPENWEATHER_API_KEY"))?,
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string()),
            openweather_geo_url: env::var("OPENWEATHER_GEO_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/geo/1.0".to_string()),

            // Refresh & freshness
            weather_update_interval_minutes: env::var("WEATHER_UPDATE_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Cache TTLs
            weather_cache_minutes: env::var("WEATHER_CACHE_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            forecast_cache_minutes: env::var("FORECAST_CACHE_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Default cities
            default_city_ids: env::var("DEFAULT_CITY_IDS")
                .map(|s| parse_city_ids(&s))
                .unwrap_or_else(|_| DEFAULT_CITY_IDS.to_vec()),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Rate limiting
            disable_rate_limiting: env::var("DISABLE_RATE_LIMITING")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            rate_limit_metadata_per_second: env::var("RATE_LIMIT_METADATA_PER_SECOND")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            rate_limit_metadata_burst: env::var("RATE_LIMIT_METADATA_BURST")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            rate_limit_data_per_second: env::var("RATE_LIMIT_DATA_PER_SECOND")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            rate_limit_data_burst: env::var("RATE_LIMIT_DATA_BURST")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),

            // Caching
            cache_max_bytes: env::var("CACHE_MAX_BYTES")
                .unwrap_or_else(|_| "209715200".to_string())
                .parse()
                .unwrap_or(209_715_200), // 200MB default

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Parse a comma-separated list of OpenWeatherMap city ids.
/// Unparseable entries are dropped; an empty result falls back to the
/// built-in default list.
#[must_use]
pub fn parse_city_ids(s: &str) -> Vec<i64> {
    let ids: Vec<i64> = s
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();

    if ids.is_empty() {
        DEFAULT_CITY_IDS.to_vec()
    } else {
        ids
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
