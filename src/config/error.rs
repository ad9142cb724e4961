//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid source base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("No variable set selected (enable wind and/or temperature)")]
    NoVariablesSelected,

    #[error("Latitudes must lie within [-90, 90] with bottom_lat below top_lat")]
    InvalidLatitude,

    #[error("left_lon must be below right_lon")]
    InvalidLongitude,

    #[error("Poll interval must be positive")]
    InvalidPollInterval,

    #[error("Raw and JSON cache directories must be distinct")]
    CacheDirsOverlap,

    #[error("Converter limits must be positive")]
    InvalidConverterLimit,
}
