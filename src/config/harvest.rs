//! Harvest window and cadence

use serde::Deserialize;
use std::time::Duration;

use crate::domain::harvest::HarvestPolicy;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// How far back a lineage may roll, in days
    #[serde(default = "default_max_history_days")]
    pub max_history_days: u32,

    /// Highest forecast offset fetched per cycle, in hours
    #[serde(default = "default_max_forecast_hours")]
    pub max_forecast_hours: u32,

    /// Seconds between driver ticks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl HarvestConfig {
    pub fn policy(&self) -> HarvestPolicy {
        HarvestPolicy::new(self.max_history_days, self.max_forecast_hours)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        Ok(())
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_history_days: default_max_history_days(),
            max_forecast_hours: default_max_forecast_hours(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_max_history_days() -> u32 {
    1
}

fn default_max_forecast_hours() -> u32 {
    18
}

fn default_poll_interval() -> u64 {
    15 * 60
}
