//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Harvest and eviction are commands; nearest-match retrieval is a query.

pub mod handlers;

pub use handlers::{
    ConvertArtifactCommand, ConvertArtifactHandler, ConvertArtifactResult, EvictStaleCommand,
    EvictStaleHandler, EvictionReport, FindNearestHandler, FindNearestQuery, HarvestReport,
    NearestArtifact, RunHarvestCommand, RunHarvestHandler,
};
