//! Cycle, forecast offset and the canonical identity built from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

use super::resolver::{
    truncate_to_hour, CYCLE_INTERVAL_HOURS, FORECAST_OFFSET_WIDTH, FORECAST_STEP_HOURS,
};
use crate::domain::foundation::ValidationError;

/// Largest offset that still fits the zero-padded width of the identity string.
pub const MAX_FORECAST_OFFSET_HOURS: u32 = 999;

/// A publication run: a UTC timestamp aligned to the cycle interval.
///
/// Invariant: minutes, seconds and sub-seconds are zero and
/// `hour % CYCLE_INTERVAL_HOURS == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycle(DateTime<Utc>);

impl Cycle {
    /// Returns the cycle whose run contains `timestamp` (hour rounded down).
    pub fn containing(timestamp: DateTime<Utc>) -> Self {
        let hour_start = truncate_to_hour(timestamp);
        let hour = i64::from(hour_start.hour());
        let excess = hour.rem_euclid(CYCLE_INTERVAL_HOURS);
        Self(hour_start - Duration::hours(excess))
    }

    /// Builds a cycle from a calendar date and a cycle hour.
    pub fn from_date_hour(date: NaiveDate, hour: u32) -> Result<Self, ValidationError> {
        if hour >= 24 {
            return Err(ValidationError::out_of_range("cycle_hour", 0, 23, i64::from(hour)));
        }
        if i64::from(hour) % CYCLE_INTERVAL_HOURS != 0 {
            return Err(ValidationError::invalid_format(
                "cycle_hour",
                format!("{} is not a multiple of {}", hour, CYCLE_INTERVAL_HOURS),
            ));
        }
        let naive = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| ValidationError::invalid_format("cycle_hour", "not a valid time"))?;
        Ok(Self(naive.and_utc()))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Calendar date of the run.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Hour of day of the run (0, 6, 12 or 18).
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// The run one cycle interval earlier, or `None` at the start of the calendar.
    pub fn previous(&self) -> Option<Self> {
        self.0
            .checked_sub_signed(Duration::hours(CYCLE_INTERVAL_HOURS))
            .map(Self)
    }

    /// The run one cycle interval later, or `None` at the end of the calendar.
    pub fn next(&self) -> Option<Self> {
        self.0
            .checked_add_signed(Duration::hours(CYCLE_INTERVAL_HOURS))
            .map(Self)
    }

    /// Whole hours from this cycle to `timestamp`, negative when `timestamp` lies before it.
    pub fn hours_until(&self, timestamp: DateTime<Utc>) -> i64 {
        (timestamp - self.0).num_hours()
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{:02}", self.0.format("%Y-%m-%d"), self.hour())
    }
}

/// Hours past a cycle that a data item projects; always a multiple of the forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastOffset(u32);

impl ForecastOffset {
    /// The analysis step of a cycle.
    pub const ZERO: ForecastOffset = ForecastOffset(0);

    /// Creates an offset, rejecting values off the forecast-step grid.
    pub fn new(hours: u32) -> Result<Self, ValidationError> {
        if hours > MAX_FORECAST_OFFSET_HOURS {
            return Err(ValidationError::out_of_range(
                "forecast_offset",
                0,
                i64::from(MAX_FORECAST_OFFSET_HOURS),
                i64::from(hours),
            ));
        }
        if i64::from(hours) % FORECAST_STEP_HOURS != 0 {
            return Err(ValidationError::invalid_format(
                "forecast_offset",
                format!("{} is not a multiple of {}", hours, FORECAST_STEP_HOURS),
            ));
        }
        Ok(Self(hours))
    }

    /// Offset in hours.
    pub fn hours(&self) -> u32 {
        self.0
    }

    /// The following forecast step, or `None` once the identity width is exhausted.
    pub fn next_step(&self) -> Option<Self> {
        let step = FORECAST_STEP_HOURS as u32;
        Self::new(self.0 + step).ok()
    }
}

impl fmt::Display for ForecastOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = FORECAST_OFFSET_WIDTH)
    }
}

/// Unique key of one cached item: a cycle plus a forecast offset.
///
/// Serialized canonically as `YYYY-MM-DDThh.fOOO`, e.g. `2024-03-01T06.f012`.
/// Parsing only accepts the canonical form, so two identities are equal
/// exactly when their strings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    cycle: Cycle,
    offset: ForecastOffset,
}

impl Identity {
    pub fn new(cycle: Cycle, offset: ForecastOffset) -> Self {
        Self { cycle, offset }
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn offset(&self) -> ForecastOffset {
        self.offset
    }

    /// The instant this item describes (`cycle + offset`).
    pub fn valid_time(&self) -> DateTime<Utc> {
        *self.cycle.as_datetime() + Duration::hours(i64::from(self.offset.hours()))
    }

    /// Age of the item's cycle relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - *self.cycle.as_datetime()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.f{}", self.cycle, self.offset)
    }
}

impl FromStr for Identity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, offset) = s
            .split_once(".f")
            .ok_or_else(|| ValidationError::invalid_format("identity", "missing '.f' separator"))?;
        let (date, hour) = head
            .split_once('T')
            .ok_or_else(|| ValidationError::invalid_format("identity", "missing 'T' separator"))?;

        if date.len() != 10 {
            return Err(ValidationError::invalid_format("identity", "date must be YYYY-MM-DD"));
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ValidationError::invalid_format("identity", e.to_string()))?;

        let hour = parse_fixed_digits(hour, 2, "cycle_hour")?;
        let offset = parse_fixed_digits(offset, FORECAST_OFFSET_WIDTH, "forecast_offset")?;

        Ok(Identity::new(
            Cycle::from_date_hour(date, hour)?,
            ForecastOffset::new(offset)?,
        ))
    }
}

fn parse_fixed_digits(s: &str, width: usize, field: &str) -> Result<u32, ValidationError> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(
            field,
            format!("expected exactly {} digits, got '{}'", width, s),
        ));
    }
    s.parse()
        .map_err(|_| ValidationError::invalid_format(field, format!("'{}' is not a number", s)))
}
