//! NOMADS adapter - the upstream GFS grib filter.

mod client;
mod query;

pub use client::NomadsSource;
pub use query::{Extent, NomadsQuery, Resolution, Variables};
