//! Harvest handlers.

mod convert_artifact;
mod run_harvest;

pub use convert_artifact::{ConvertArtifactCommand, ConvertArtifactHandler, ConvertArtifactResult};
pub use run_harvest::{HarvestReport, RunHarvestCommand, RunHarvestHandler};
