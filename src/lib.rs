//! GFS Archive - rolling local archive of GFS model output.
//!
//! Harvests forecast files from the NOMADS grib filter, converts them to
//! JSON through an external converter, evicts stale items, and serves the
//! cached item nearest to a requested time over HTTP.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
