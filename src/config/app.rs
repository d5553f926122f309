//! Main application configuration
//!
//! This module defines the primary configuration structures for the ladder
//! service, including environment variable loading, TOML file loading and
//! validation.

use crate::auth::Role;
use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Host the HTTP server binds to
    pub http_host: String,
    /// Port for the ladder API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Participant store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// How long a match resolution waits for the write transaction
    pub lock_timeout_ms: u64,
}

/// A bearer token mapped to a principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub principal_id: String,
    pub role: Role,
}

/// Principal resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Static bearer tokens
    pub tokens: Vec<StaticToken>,
    /// Development principal used when no token is presented
    pub dev_principal_id: Option<String>,
    pub dev_display_name: Option<String>,
    pub dev_role: Option<Role>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ladder-engine".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            config.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            config.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Rating settings
        if let Ok(starting) = env::var("STARTING_RATING") {
            config.rating.starting_rating = starting
                .parse()
                .map_err(|_| anyhow!("Invalid STARTING_RATING value: {}", starting))?;
        }
        if let Ok(k) = env::var("K_FACTOR") {
            config.rating.k_factor = k
                .parse()
                .map_err(|_| anyhow!("Invalid K_FACTOR value: {}", k))?;
        }
        if let Ok(width) = env::var("DIVISION_WIDTH") {
            config.rating.division_width = width
                .parse()
                .map_err(|_| anyhow!("Invalid DIVISION_WIDTH value: {}", width))?;
        }
        if let Ok(limit) = env::var("RECENT_MATCHES_LIMIT") {
            config.rating.recent_matches_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid RECENT_MATCHES_LIMIT value: {}", limit))?;
        }
        if let Ok(limit) = env::var("MATCH_HISTORY_LIMIT") {
            config.rating.match_history_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid MATCH_HISTORY_LIMIT value: {}", limit))?;
        }

        // Storage settings
        if let Ok(timeout) = env::var("STORE_LOCK_TIMEOUT_MS") {
            config.storage.lock_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid STORE_LOCK_TIMEOUT_MS value: {}", timeout))?;
        }

        // Development principal
        if let Ok(id) = env::var("DEV_AUTH_USER_ID") {
            config.auth.dev_principal_id = Some(id);
        }
        if let Ok(name) = env::var("DEV_AUTH_DISPLAYNAME") {
            config.auth.dev_display_name = Some(name);
        }
        if let Ok(role) = env::var("DEV_AUTH_ROLE") {
            config.auth.dev_role = Some(
                role.parse()
                    .map_err(|_| anyhow!("Invalid DEV_AUTH_ROLE value: {}", role))?,
            );
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing sections take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get store lock timeout as Duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.lock_timeout_ms)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.storage.lock_timeout_ms == 0 {
        return Err(anyhow!("Store lock timeout must be greater than 0"));
    }

    config.rating.validate()?;

    for token in &config.auth.tokens {
        if token.token.is_empty() || token.principal_id.is_empty() {
            return Err(anyhow!("Auth tokens need a token and a principal id"));
        }
    }

    Ok(())
}
