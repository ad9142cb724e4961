//! Converter Port - turns a raw payload into the cache's JSON representation.

use async_trait::async_trait;
use thiserror::Error;

use super::{FilePath, StorageError};

/// Port for the external raw-to-JSON conversion step.
///
/// # Contract
///
/// Success means the conversion finished cleanly AND `output` exists
/// afterwards. Implementations do not clean up `output` on failure; the
/// caller owns it.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, raw: &FilePath, output: &FilePath) -> Result<(), ConversionError>;
}

/// Errors that can occur while converting a raw payload.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// The converter could not be started.
    #[error("Failed to start converter: {0}")]
    Spawn(String),

    /// The converter ran but reported failure.
    #[error("Converter exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    /// Captured console output grew past the configured bound.
    #[error("Converter output exceeded {max_bytes} bytes")]
    OutputTooLarge { max_bytes: usize },

    /// The converter did not finish in time and was killed.
    #[error("Converter timed out after {secs}s")]
    TimedOut { secs: u64 },

    /// The converter reported success but wrote nothing.
    #[error("Converter produced no output at {path}")]
    MissingOutput { path: String },

    /// Staging or committing the output failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ConversionError {
    pub fn spawn(message: impl Into<String>) -> Self {
        ConversionError::Spawn(message.into())
    }

    pub fn missing_output(path: impl Into<String>) -> Self {
        ConversionError::MissingOutput { path: path.into() }
    }
}
