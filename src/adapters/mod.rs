//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Directory-backed artifact cache
//! - `nomads` - NOMADS filter endpoint client
//! - `converter` - grib2json subprocess
//! - `clock` - System and fixed clocks
//! - `background` - Periodic harvest/eviction driver
//! - `http` - Retrieval REST API

pub mod background;
pub mod clock;
pub mod converter;
pub mod http;
pub mod nomads;
pub mod storage;

pub use background::{PeriodicDriver, PeriodicDriverConfig};
pub use clock::{FixedClock, SystemClock};
pub use converter::{Grib2JsonConfig, Grib2JsonConverter};
pub use http::{build_router, RetrievalAppState};
pub use nomads::{NomadsQuery, NomadsSource};
pub use storage::LocalArtifactStore;
