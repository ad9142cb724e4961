//! Cache directories and eviction

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Scratch directory for downloaded raw payloads
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Directory holding converted JSON artifacts
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,

    /// Run the staleness sweep on every driver tick
    #[serde(default = "default_auto_cleanup")]
    pub auto_cleanup: bool,

    /// Artifacts whose cycle is older than this many days are evicted
    #[serde(default = "default_cleanup_threshold_days")]
    pub cleanup_threshold_days: u32,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.raw_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("cache.raw_dir"));
        }
        if self.json_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("cache.json_dir"));
        }
        if self.raw_dir == self.json_dir {
            return Err(ValidationError::CacheDirsOverlap);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            json_dir: default_json_dir(),
            auto_cleanup: default_auto_cleanup(),
            cleanup_threshold_days: default_cleanup_threshold_days(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("grib-data")
}

fn default_json_dir() -> PathBuf {
    PathBuf::from("json-data")
}

fn default_auto_cleanup() -> bool {
    true
}

fn default_cleanup_threshold_days() -> u32 {
    1
}
