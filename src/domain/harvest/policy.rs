//! Bounds on how far a harvest lineage may walk.

use chrono::Duration;

/// Limits applied by the decide-next rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestPolicy {
    /// How far back (from now) a previous cycle may be before the lineage ends.
    pub max_history: Duration,
    /// Offsets above this end the forward walk through a cycle.
    pub max_forecast_hours: u32,
}

impl HarvestPolicy {
    pub fn new(max_history_days: u32, max_forecast_hours: u32) -> Self {
        Self {
            max_history: Duration::days(i64::from(max_history_days)),
            max_forecast_hours,
        }
    }
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self::new(1, 18)
    }
}
