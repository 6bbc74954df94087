use moka::future::Cache;
use moka::Expiry;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::openweather::OpenWeatherClient;

/// Cached provider response. Each entry carries its own TTL because the
/// endpoints cache for different durations (5 minutes for id lookups up to
/// 30 minutes for forecasts).
#[derive(Clone)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
    pub ttl: Duration,
}

/// Cache for provider responses. Key is the request kind plus its
/// identifying components, value is the serialized response.
/// Weighted by byte size to enforce a memory limit.
pub type ResponseCache = Cache<String, CachedResponse>;

struct PerEntryTtl;

impl Expiry<String, CachedResponse> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Build the byte-weighted, per-entry-TTL response cache.
#[must_use]
pub fn build_response_cache(max_bytes: u64) -> ResponseCache {
    Cache::builder()
        .weigher(|_key: &String, value: &CachedResponse| -> u32 {
            // Weight is the size in bytes (capped at u32::MAX)
            value.data.len().try_into().unwrap_or(u32::MAX)
        })
        .max_capacity(max_bytes)
        .expire_after(PerEntryTtl)
        .build()
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub openweather: Arc<OpenWeatherClient>,
    pub response_cache: ResponseCache,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, openweather: OpenWeatherClient) -> Self {
        let cache = build_response_cache(config.cache_max_bytes);

        Self {
            db,
            config: Arc::new(config),
            openweather: Arc::new(openweather),
            response_cache: cache,
        }
    }
}
