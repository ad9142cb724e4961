//! Cycle module - publication grid arithmetic.
//!
//! Converts arbitrary timestamps into the (cycle, forecast offset) pairs the
//! upstream model publishes, and back into canonical identity strings.

mod identity;
mod resolver;

pub use identity::{Cycle, ForecastOffset, Identity, MAX_FORECAST_OFFSET_HOURS};
pub use resolver::{
    identity_for, nearest_candidate, round_to_cycle, truncate_to_hour, Rounding,
    CYCLE_INTERVAL_HOURS, FORECAST_OFFSET_WIDTH, FORECAST_STEP_HOURS,
};

pub(crate) use resolver::is_beyond_limit;
