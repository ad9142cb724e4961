//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ArtifactStore` - On-disk raw scratch area and converted cache
//! - `RemoteSource` - Upstream publisher of raw payloads
//! - `Converter` - External raw-to-JSON conversion
//! - `Clock` - Current time

mod artifact_store;
mod clock;
mod converter;
mod remote_source;

pub use artifact_store::{
    ArtifactStore, ConvertedListing, FilePath, RawArtifact, StorageError, StoredArtifact,
};
pub use clock::Clock;
pub use converter::{ConversionError, Converter};
pub use remote_source::{ByteStream, FetchError, RemotePayload, RemoteSource};
