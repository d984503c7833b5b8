//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the SkillSwap service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory fallback)
    pub postgres_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable request/response logging
    pub log_requests: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                postgres_url: "postgresql://localhost:5432/skillswap".to_string(),
                postgres_enabled: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("SKILLSWAP_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("SKILLSWAP_PORT") {
            config.server.port = port
                .parse()
                .context("SKILLSWAP_PORT must be a valid port number")?;
        }
        if let Ok(url) = env::var("SKILLSWAP_POSTGRES_URL") {
            config.database.postgres_url = url;
            config.database.postgres_enabled = true;
        }
        if let Ok(enabled) = env::var("SKILLSWAP_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("SKILLSWAP_POSTGRES_ENABLED must be true or false")?;
        }
        if let Ok(level) = env::var("SKILLSWAP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(log_requests) = env::var("SKILLSWAP_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("SKILLSWAP_LOG_REQUESTS must be true or false")?;
        }

        Ok(config)
    }
}
