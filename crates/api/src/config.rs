use std::env;
use std::str::FromStr;

use atelier_core::money::DEFAULT_CURRENCY;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL. Without one the server keeps everything
    /// in memory.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// HS256 secret shared with the identity provider that mints tokens.
    pub jwt_secret: String,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    /// Currency for prices entered without one.
    pub default_currency: String,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: text("HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 3030)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS", 5)?,
            jwt_secret: text("JWT_SECRET", "dev-secret-change-me-in-production"),
            event_bus_capacity: parsed(&lookup, "EVENT_BUS_CAPACITY", 1024)?,
            log_level: text("LOG_LEVEL", "info"),
            default_currency: text("DEFAULT_CURRENCY", DEFAULT_CURRENCY).to_uppercase(),
            max_body_bytes: parsed(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?,
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            db_max_connections: 20,
            db_min_connections: 5,
            jwt_secret: "dev-secret-change-me-in-production".to_string(),
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
