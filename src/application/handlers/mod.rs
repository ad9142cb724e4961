//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod cache;
pub mod harvest;
pub mod retrieval;

pub use cache::{EvictStaleCommand, EvictStaleHandler, EvictionReport};
pub use harvest::{
    ConvertArtifactCommand, ConvertArtifactHandler, ConvertArtifactResult, HarvestReport,
    RunHarvestCommand, RunHarvestHandler,
};
pub use retrieval::{FindNearestHandler, FindNearestQuery, NearestArtifact};
