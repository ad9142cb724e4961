//! Clock Port - source of "now".

use chrono::{DateTime, Utc};

/// Port for reading the current time.
///
/// Harvest bounds, future limits and eviction ages are all measured
/// against this clock, so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
