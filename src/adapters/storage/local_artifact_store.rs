//! Local Filesystem Artifact Store - Implementation of ArtifactStore.
//!
//! Keeps raw payloads and converted JSON artifacts in two flat directories,
//! each file named after its canonical identity.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::cycle::Identity;
use crate::ports::{
    ArtifactStore, ByteStream, ConvertedListing, FilePath, RawArtifact, StorageError,
    StoredArtifact,
};

const CONVERTED_EXTENSION: &str = ".json";
const STAGING_EXTENSION: &str = ".json.tmp";
const PARTIAL_EXTENSION: &str = ".part";

/// Returns true if `path` exists. Never creates anything.
///
/// A missing path is `Ok(false)`; any other failure to stat it is an error.
pub async fn exists(path: &Path) -> Result<bool, StorageError> {
    fs::try_exists(path)
        .await
        .map_err(|e| map_io(path, "stat", e))
}

/// Creates `path` and its parents if absent. Idempotent.
pub async fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).await.map_err(|e| {
        StorageError::io(format!(
            "Failed to create directory {}: {}",
            path.display(),
            e
        ))
    })
}

/// Local filesystem store for raw and converted artifacts.
///
/// # Directory Structure
///
/// ```text
/// {raw_dir}/
/// └── 2024-03-01T06.f003          (2024-03-01T06.f003.part while downloading)
/// {json_dir}/
/// ├── 2024-03-01T06.f000.json
/// └── 2024-03-01T06.f003.json     (2024-03-01T06.f003.json.tmp while converting)
/// ```
///
/// # Atomic Writes
///
/// Both areas use a write-to-temp-then-rename pattern, so a reader never
/// sees a half-written file under its final name.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    raw_dir: PathBuf,
    json_dir: PathBuf,
}

impl LocalArtifactStore {
    /// Creates a store over the given directories. Nothing is touched on disk.
    pub fn new(raw_dir: impl Into<PathBuf>, json_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            json_dir: json_dir.into(),
        }
    }

    fn raw_path(&self, identity: &Identity) -> PathBuf {
        self.raw_dir.join(identity.to_string())
    }

    fn partial_path(&self, identity: &Identity) -> PathBuf {
        self.raw_dir
            .join(format!("{}{}", identity, PARTIAL_EXTENSION))
    }

    fn json_path(&self, identity: &Identity) -> PathBuf {
        self.json_dir
            .join(format!("{}{}", identity, CONVERTED_EXTENSION))
    }

    fn staging(&self, identity: &Identity) -> PathBuf {
        self.json_dir
            .join(format!("{}{}", identity, STAGING_EXTENSION))
    }

    /// Extracts the identity from a file name like "{identity}.json".
    fn parse_converted_name(file_name: &str) -> Option<Identity> {
        file_name
            .strip_suffix(CONVERTED_EXTENSION)
            .and_then(|stem| stem.parse().ok())
    }

    async fn stream_to(&self, path: &Path, mut body: ByteStream) -> Result<u64, StorageError> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::io(format!("Failed to create {}: {}", path.display(), e))
        })?;

        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StorageError::stream_interrupted(e.to_string()))?;
            file.write_all(&chunk).await.map_err(|e| {
                StorageError::io(format!("Failed to write to {}: {}", path.display(), e))
            })?;
            written += chunk.len() as u64;
        }

        file.sync_all().await.map_err(|e| {
            StorageError::io(format!("Failed to sync {}: {}", path.display(), e))
        })?;
        Ok(written)
    }
}

fn map_io(path: &Path, action: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::not_found(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            StorageError::permission_denied(path.display().to_string())
        }
        _ => StorageError::io(format!("Failed to {} {}: {}", action, path.display(), e)),
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn ensure_dirs(&self) -> Result<(), StorageError> {
        ensure_dir(&self.raw_dir).await?;
        ensure_dir(&self.json_dir).await
    }

    async fn converted_exists(&self, identity: &Identity) -> Result<bool, StorageError> {
        exists(&self.json_path(identity)).await
    }

    fn converted_path(&self, identity: &Identity) -> FilePath {
        FilePath::new(self.json_path(identity))
    }

    fn staging_path(&self, identity: &Identity) -> FilePath {
        FilePath::new(self.staging(identity))
    }

    async fn write_raw(
        &self,
        identity: &Identity,
        body: ByteStream,
    ) -> Result<RawArtifact, StorageError> {
        ensure_dir(&self.raw_dir).await?;

        let partial = self.partial_path(identity);
        let final_path = self.raw_path(identity);

        let size = match self.stream_to(&partial, body).await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        fs::rename(&partial, &final_path).await.map_err(|e| {
            StorageError::io(format!(
                "Failed to rename {} to {}: {}",
                partial.display(),
                final_path.display(),
                e
            ))
        })?;

        Ok(RawArtifact::new(*identity, final_path, size))
    }

    async fn discard_raw(&self, artifact: RawArtifact) -> Result<(), StorageError> {
        let path = artifact.path().as_path();
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(path, "delete", e)),
        }
    }

    async fn purge_raw(&self) -> Result<usize, StorageError> {
        if !exists(&self.raw_dir).await? {
            return Ok(0);
        }

        let mut entries = fs::read_dir(&self.raw_dir)
            .await
            .map_err(|e| map_io(&self.raw_dir, "read directory", e))?;

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::io(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to purge raw file"),
            }
        }
        Ok(removed)
    }

    async fn commit_converted(&self, identity: &Identity) -> Result<StoredArtifact, StorageError> {
        let staging = self.staging(identity);
        let final_path = self.json_path(identity);

        let meta = fs::metadata(&staging)
            .await
            .map_err(|e| map_io(&staging, "stat", e))?;

        fs::rename(&staging, &final_path).await.map_err(|e| {
            StorageError::io(format!(
                "Failed to rename {} to {}: {}",
                staging.display(),
                final_path.display(),
                e
            ))
        })?;

        Ok(StoredArtifact::new(*identity, final_path, meta.len()))
    }

    async fn discard_staging(&self, identity: &Identity) -> Result<(), StorageError> {
        let staging = self.staging(identity);
        match fs::remove_file(&staging).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&staging, "delete", e)),
        }
    }

    async fn list_converted(&self) -> Result<ConvertedListing, StorageError> {
        let mut listing = ConvertedListing::default();
        if !exists(&self.json_dir).await? {
            return Ok(listing);
        }

        let mut entries = fs::read_dir(&self.json_dir)
            .await
            .map_err(|e| map_io(&self.json_dir, "read directory", e))?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::io(format!("Failed to read directory entry: {}", e))
        })? {
            let file_name = entry.file_name().to_string_lossy().to_string();

            // In-flight converter output is not an artifact yet
            if file_name.ends_with(STAGING_EXTENSION) {
                continue;
            }

            match Self::parse_converted_name(&file_name) {
                Some(identity) => {
                    let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                    listing
                        .artifacts
                        .push(StoredArtifact::new(identity, entry.path(), size));
                }
                None => listing.unrecognized.push(file_name),
            }
        }

        listing.artifacts.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(listing)
    }

    async fn read_converted(&self, identity: &Identity) -> Result<Bytes, StorageError> {
        let path = self.json_path(identity);
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| map_io(&path, "read", e))
    }

    async fn delete_converted(&self, identity: &Identity) -> Result<(), StorageError> {
        let path = self.json_path(identity);
        fs::remove_file(&path)
            .await
            .map_err(|e| map_io(&path, "delete", e))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════════
