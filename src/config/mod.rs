//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GFS_ARCHIVE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gfs_archive::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod cache;
mod converter;
mod error;
mod harvest;
mod server;
mod source;

pub use cache::CacheConfig;
pub use converter::ConverterConfig;
pub use error::{ConfigError, ValidationError};
pub use harvest::HarvestConfig;
pub use server::{Environment, LogFormat, ServerConfig};
pub use source::SourceConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream product selection (resolution, variables, extent)
    #[serde(default)]
    pub source: SourceConfig,

    /// Harvest window and driver cadence
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Cache directories and eviction
    #[serde(default)]
    pub cache: CacheConfig,

    /// External converter invocation
    #[serde(default)]
    pub converter: ConverterConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GFS_ARCHIVE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GFS_ARCHIVE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GFS_ARCHIVE__HARVEST__MAX_HISTORY_DAYS=3` -> `harvest.max_history_days = 3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GFS_ARCHIVE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is inconsistent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.source.validate()?;
        self.harvest.validate()?;
        self.cache.validate()?;
        self.converter.validate()?;
        Ok(())
    }
}
