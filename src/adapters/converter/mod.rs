//! Converter adapters.

mod grib2json;

pub use grib2json::{Grib2JsonConfig, Grib2JsonConverter};
