//! External converter configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::converter::Grib2JsonConfig;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    /// Program plus leading arguments, split on whitespace
    #[serde(default = "default_command")]
    pub command: String,

    /// Cap on captured stdout/stderr per stream
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConverterConfig {
    pub fn grib2json(&self) -> Grib2JsonConfig {
        Grib2JsonConfig::new(self.command.clone())
            .with_max_output_bytes(self.max_output_bytes)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.command.trim().is_empty() {
            return Err(ValidationError::MissingRequired("converter.command"));
        }
        if self.max_output_bytes == 0 || self.timeout_secs == 0 {
            return Err(ValidationError::InvalidConverterLimit);
        }
        Ok(())
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            max_output_bytes: default_max_output_bytes(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_command() -> String {
    "./converter/bin/grib2json".to_string()
}

fn default_max_output_bytes() -> usize {
    500 * 1024
}

fn default_timeout() -> u64 {
    300
}
