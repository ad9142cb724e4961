//! Artifact Store Port - file cache for raw and converted model output.
//!
//! Two areas live behind this port: a raw scratch area holding downloaded
//! payloads until conversion, and the converted area holding the servable
//! JSON artifacts keyed by identity.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use thiserror::Error;

use super::ByteStream;
use crate::domain::cycle::Identity;

/// Port for the on-disk artifact cache.
///
/// # Contract
///
/// Implementations must:
/// - Key every file by the canonical identity string
/// - Never expose a partially written converted artifact under its final name
/// - Keep `exists`-style probes free of side effects
///
/// # File Organization
///
/// ```text
/// {raw_dir}/{identity}            raw payload, deleted after conversion
/// {json_dir}/{identity}.json.tmp  converter output while in flight
/// {json_dir}/{identity}.json      servable artifact
/// ```
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Creates the raw and converted directories if absent. Idempotent.
    async fn ensure_dirs(&self) -> Result<(), StorageError>;

    /// Returns true if a converted artifact exists for `identity`.
    async fn converted_exists(&self, identity: &Identity) -> Result<bool, StorageError>;

    /// Final path of the converted artifact for `identity`.
    fn converted_path(&self, identity: &Identity) -> FilePath;

    /// Path the converter writes to before the artifact is committed.
    fn staging_path(&self, identity: &Identity) -> FilePath;

    /// Streams a raw payload to the scratch area.
    ///
    /// A failed or interrupted stream leaves no raw file behind.
    async fn write_raw(
        &self,
        identity: &Identity,
        body: ByteStream,
    ) -> Result<RawArtifact, StorageError>;

    /// Deletes a raw payload, consuming its handle.
    async fn discard_raw(&self, artifact: RawArtifact) -> Result<(), StorageError>;

    /// Deletes everything in the scratch area. Returns how many files were removed.
    async fn purge_raw(&self) -> Result<usize, StorageError>;

    /// Moves the staged converter output to its final name.
    async fn commit_converted(&self, identity: &Identity) -> Result<StoredArtifact, StorageError>;

    /// Removes staged converter output, if any.
    async fn discard_staging(&self, identity: &Identity) -> Result<(), StorageError>;

    /// Lists every converted artifact.
    ///
    /// Files whose names do not parse as an identity are reported separately
    /// so callers can log them without aborting.
    async fn list_converted(&self) -> Result<ConvertedListing, StorageError>;

    /// Reads a converted artifact's bytes.
    async fn read_converted(&self, identity: &Identity) -> Result<Bytes, StorageError>;

    /// Deletes a converted artifact.
    async fn delete_converted(&self, identity: &Identity) -> Result<(), StorageError>;
}

/// Represents a file path (absolute or relative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath(PathBuf);

impl FilePath {
    /// Creates a new file path from a PathBuf.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the path as a string (lossy conversion for non-UTF8 paths).
    pub fn to_string_lossy(&self) -> String {
        self.0.to_string_lossy().to_string()
    }

    /// Returns a reference to the inner PathBuf.
    pub fn as_path(&self) -> &std::path::Path {
        &self.0
    }

    /// Returns the file name without the directory.
    pub fn file_name(&self) -> Option<String> {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

impl From<PathBuf> for FilePath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self::new(PathBuf::from(s))
    }
}

/// Handle to a downloaded raw payload awaiting conversion.
///
/// Not `Clone`: each handle is consumed by exactly one of conversion or discard.
#[derive(Debug, PartialEq, Eq)]
pub struct RawArtifact {
    identity: Identity,
    path: FilePath,
    size_bytes: u64,
}

impl RawArtifact {
    pub fn new(identity: Identity, path: impl Into<FilePath>, size_bytes: u64) -> Self {
        Self {
            identity,
            path: path.into(),
            size_bytes,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// A converted artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub identity: Identity,
    pub path: FilePath,
    pub size_bytes: u64,
}

impl StoredArtifact {
    pub fn new(identity: Identity, path: impl Into<FilePath>, size_bytes: u64) -> Self {
        Self {
            identity,
            path: path.into(),
            size_bytes,
        }
    }
}

/// Result of enumerating the converted area.
#[derive(Debug, Clone, Default)]
pub struct ConvertedListing {
    pub artifacts: Vec<StoredArtifact>,
    /// File names that do not follow the `{identity}.json` pattern.
    pub unrecognized: Vec<String>,
}

/// Errors that can occur during file storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// File was not found.
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// Permission denied accessing the file.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// IO error during file operation.
    #[error("IO error: {message}")]
    Io { message: String },

    /// The incoming byte stream failed before it was fully written.
    #[error("Stream interrupted: {message}")]
    StreamInterrupted { message: String },
}

impl StorageError {
    /// Creates a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a permission denied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a stream interrupted error.
    pub fn stream_interrupted(message: impl Into<String>) -> Self {
        Self::StreamInterrupted {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::permission_denied(err.to_string())
            }
            _ => StorageError::io(err.to_string()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════════
