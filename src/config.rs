use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// Backend base URL. `None` serves discovery from the local catalog.
    pub listing_source_url: Option<String>,
    pub listing_source_token: Option<String>,
    pub listing_source_timeout: Duration,
    pub candidate_cache_ttl: Duration,
    pub defaults: FilterDefaults,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterDefaults {
    pub max_distance_km: f64,
    pub max_price: i64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            max_distance_km: 10.0,
            max_price: 10_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = FilterDefaults::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            listing_source_url: non_empty_var("LISTING_SOURCE_URL"),
            listing_source_token: non_empty_var("LISTING_SOURCE_TOKEN"),
            listing_source_timeout: Duration::from_millis(parse_or_default(
                "LISTING_SOURCE_TIMEOUT_MS",
                10_000,
            )?),
            candidate_cache_ttl: Duration::from_secs(parse_or_default(
                "CANDIDATE_CACHE_TTL_SECS",
                0,
            )?),
            defaults: FilterDefaults {
                max_distance_km: parse_or_default(
                    "DEFAULT_MAX_DISTANCE_KM",
                    defaults.max_distance_km,
                )?,
                max_price: parse_or_default("DEFAULT_MAX_PRICE", defaults.max_price)?,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
