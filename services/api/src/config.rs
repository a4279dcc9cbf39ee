//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_BARCODE_API_URL: &str = "https://world.openfoodfacts.org/api/v2/product";
pub const DEFAULT_DIRECTIONS_API_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Without a database URL the service keeps its data in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub vision_model: String,
    pub barcode_api_url: String,
    pub directions_api_url: String,
    pub directions_api_key: Option<String>,
    pub http_timeout: Duration,
    pub display_name: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        // Blank values count as unset.
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = optional("DATABASE_URL");

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Collaborator Settings ---
        let openai_api_key = optional("OPENAI_API_KEY");
        let vision_model = var_or("VISION_MODEL", "gpt-4o-mini");
        let barcode_api_url = var_or("BARCODE_API_URL", DEFAULT_BARCODE_API_URL);
        let directions_api_url = var_or("DIRECTIONS_API_URL", DEFAULT_DIRECTIONS_API_URL);
        let directions_api_key = optional("DIRECTIONS_API_KEY");

        let timeout_str = var_or("HTTP_TIMEOUT_SECS", "30");
        let http_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "HTTP_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        let display_name = var_or("DISPLAY_NAME", "Eco Friend");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            vision_model,
            barcode_api_url,
            directions_api_url,
            directions_api_key,
            http_timeout,
            display_name,
        })
    }
}
