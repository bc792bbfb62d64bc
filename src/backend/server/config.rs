/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration,
 * including the optional PostgreSQL database connection.
 *
 * # Configuration Sources
 *
 * Configuration is read from environment variables (after `.env` has been
 * loaded by the binary), with defaults suited to local development:
 *
 * | Variable                     | Default | Meaning                              |
 * |------------------------------|---------|--------------------------------------|
 * | `SERVER_PORT`                | 5000    | HTTP and WebSocket port              |
 * | `DATABASE_URL`               | unset   | PostgreSQL URL; unset means in-memory |
 * | `CORS_ORIGIN`                | unset   | Allowed origin; unset means any       |
 * | `ROOM_CHANNEL_CAPACITY`      | 256     | Per-room broadcast buffer             |
 * | `ROOM_CLEANUP_INTERVAL_SECS` | 300     | Idle room sweep period                |
 *
 * # Error Handling
 *
 * Malformed numbers are configuration errors. A database that cannot be
 * reached is logged and the server continues with the in-memory store.
 */
use std::time::Duration;

use sqlx::PgPool;

use crate::backend::realtime::rooms::DEFAULT_ROOM_CAPACITY;
use crate::shared::ConfigError;

/// Default HTTP port
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default idle room sweep period, in seconds
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
    pub room_capacity: usize,
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            database_url: None,
            cors_origin: None,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parse_var(&non_empty, "SERVER_PORT")?.unwrap_or(defaults.port),
            database_url: non_empty("DATABASE_URL"),
            cors_origin: non_empty("CORS_ORIGIN"),
            room_capacity: parse_var(&non_empty, "ROOM_CHANNEL_CAPACITY")?
                .filter(|c: &usize| *c > 0)
                .unwrap_or(defaults.room_capacity),
            cleanup_interval: parse_var(&non_empty, "ROOM_CLEANUP_INTERVAL_SECS")?
                .filter(|s: &u64| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

/// Connect to PostgreSQL and run migrations
///
/// Returns `None` when no URL is configured or the connection fails; the
/// caller falls back to the in-memory store.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Polls will be kept in memory.");
        return None;
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Polls will be kept in memory.");
            return None;
        }
    };
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    if let Err(e) = sqlx::migrate!().run(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        tracing::warn!("Polls will be kept in memory.");
        return None;
    }
    tracing::info!("Database migrations completed successfully");

    Some(pool)
}
