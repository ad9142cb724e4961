//! Storage adapters.

mod local_artifact_store;

pub use local_artifact_store::{ensure_dir, exists, LocalArtifactStore};
