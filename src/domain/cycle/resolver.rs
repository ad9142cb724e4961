//! Maps arbitrary timestamps onto the publication grid.

use chrono::{DateTime, Duration, Timelike, Utc};

use super::identity::{Cycle, ForecastOffset, Identity};
use crate::domain::retrieval::RetrievalError;

/// Hours between two publication cycles.
pub const CYCLE_INTERVAL_HOURS: i64 = 6;

/// Hours between two forecast steps inside a cycle.
pub const FORECAST_STEP_HOURS: i64 = 3;

/// Digits used for the forecast offset in the identity string.
pub const FORECAST_OFFSET_WIDTH: usize = 3;

/// How `round_to_cycle` snaps a value onto its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Largest multiple not greater than the value.
    Floor,
    /// Closest multiple, halves rounding up.
    Nearest,
}

/// Snaps `hours` onto a multiple of `interval_hours`.
///
/// `interval_hours` must be positive.
pub fn round_to_cycle(hours: i64, interval_hours: i64, rounding: Rounding) -> i64 {
    debug_assert!(interval_hours > 0);
    match rounding {
        Rounding::Floor => hours.div_euclid(interval_hours) * interval_hours,
        Rounding::Nearest => (2 * hours + interval_hours).div_euclid(2 * interval_hours) * interval_hours,
    }
}

/// Drops minutes, seconds and sub-seconds.
pub fn truncate_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        - Duration::minutes(i64::from(timestamp.minute()))
        - Duration::seconds(i64::from(timestamp.second()))
        - Duration::nanoseconds(i64::from(timestamp.nanosecond()))
}

/// Identity of `offset` within the cycle containing `timestamp`.
///
/// Deterministic: equal inputs always give equal identities.
pub fn identity_for(timestamp: DateTime<Utc>, offset: ForecastOffset) -> Identity {
    Identity::new(Cycle::containing(timestamp), offset)
}

/// Cycle to start a nearest-match search from.
///
/// Fails when that cycle sits more than `limit_hours` after `now`, since
/// nothing newer than the present can have been published.
pub fn nearest_candidate(
    target: DateTime<Utc>,
    limit_hours: u32,
    now: DateTime<Utc>,
) -> Result<Cycle, RetrievalError> {
    let cycle = Cycle::containing(target);
    if is_beyond_limit(cycle, limit_hours, now) {
        return Err(RetrievalError::FutureBeyondLimit { cycle, limit_hours });
    }
    Ok(cycle)
}

pub(crate) fn is_beyond_limit(cycle: Cycle, limit_hours: u32, now: DateTime<Utc>) -> bool {
    (*cycle.as_datetime() - now).num_hours() > i64::from(limit_hours)
}
