//! Background services.

mod periodic_driver;

pub use periodic_driver::{PeriodicDriver, PeriodicDriverConfig, TickOutcome};
