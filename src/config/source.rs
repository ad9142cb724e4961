//! Upstream source configuration (NOMADS grib filter)

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::nomads::{Extent, NomadsQuery, Resolution, Variables};

use super::error::ValidationError;

/// Which product to pull and how to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// `fine` (0.5 degree) or `coarse` (1.0 degree)
    #[serde(default)]
    pub resolution: Resolution,

    /// Overrides the filter endpoint derived from the resolution
    pub base_url: Option<String>,

    #[serde(default = "default_true")]
    pub wind: bool,

    #[serde(default)]
    pub temperature: bool,

    #[serde(default = "default_left_lon")]
    pub left_lon: f64,

    #[serde(default = "default_right_lon")]
    pub right_lon: f64,

    #[serde(default = "default_top_lat")]
    pub top_lat: f64,

    #[serde(default = "default_bottom_lat")]
    pub bottom_lat: f64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl SourceConfig {
    /// Query template the remote source fills in per identity.
    pub fn query(&self) -> NomadsQuery {
        let query = NomadsQuery::new(self.resolution)
            .with_variables(Variables {
                wind: self.wind,
                temperature: self.temperature,
            })
            .with_extent(Extent {
                left_lon: self.left_lon,
                right_lon: self.right_lon,
                top_lat: self.top_lat,
                bottom_lat: self.bottom_lat,
            });
        match &self.base_url {
            Some(url) => query.with_endpoint(url.clone()),
            None => query,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.wind && !self.temperature {
            return Err(ValidationError::NoVariablesSelected);
        }
        let lat_range = -90.0..=90.0;
        if !lat_range.contains(&self.top_lat)
            || !lat_range.contains(&self.bottom_lat)
            || self.bottom_lat >= self.top_lat
        {
            return Err(ValidationError::InvalidLatitude);
        }
        if self.left_lon >= self.right_lon {
            return Err(ValidationError::InvalidLongitude);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if let Some(url) = &self.base_url {
            reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidBaseUrl(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            base_url: None,
            wind: default_true(),
            temperature: false,
            left_lon: default_left_lon(),
            right_lon: default_right_lon(),
            top_lat: default_top_lat(),
            bottom_lat: default_bottom_lat(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_left_lon() -> f64 {
    0.0
}

fn default_right_lon() -> f64 {
    360.0
}

fn default_top_lat() -> f64 {
    90.0
}

fn default_bottom_lat() -> f64 {
    -90.0
}

fn default_request_timeout() -> u64 {
    120
}
