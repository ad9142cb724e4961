//! Retrieval handlers.

mod find_nearest;

pub use find_nearest::{FindNearestHandler, FindNearestQuery, NearestArtifact};
