/// Configuration management for Timeline Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::services::MergeStrategyKind;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Activity timeline tuning
    pub timeline: TimelineConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Min connections in pool
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// `materialize` or `kway`
    pub merge_strategy: String,
}

impl TimelineConfig {
    /// Resolves the configured strategy, falling back to materialize
    pub fn strategy_kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::from_str(&self.merge_strategy).unwrap_or_else(|e| {
            warn!("{}, falling back to materialize", e);
            MergeStrategyKind::Materialize
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

// Default values
fn default_http_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn env_or<T: FromStr>(key: &str, default: fn() -> T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_or("PORT", default_http_port),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", default_acquire_timeout_secs),
        };

        let timeline = TimelineConfig {
            merge_strategy: std::env::var("TIMELINE_MERGE_STRATEGY")
                .unwrap_or_else(|_| "materialize".to_string()),
        };

        let logging = LoggingConfig {
            format: match std::env::var("LOG_FORMAT") {
                Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        Ok(Config {
            app,
            database,
            timeline,
            logging,
        })
    }
}
