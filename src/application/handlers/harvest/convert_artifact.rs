//! ConvertArtifactHandler - turns one raw payload into a servable artifact.

use std::sync::Arc;

use crate::ports::{ArtifactStore, ConversionError, Converter, RawArtifact, StoredArtifact};

/// Command to convert a downloaded raw payload.
#[derive(Debug)]
pub struct ConvertArtifactCommand {
    pub raw: RawArtifact,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConvertArtifactResult {
    pub artifact: StoredArtifact,
}

/// Handler for the conversion pipeline.
///
/// The converter writes to a staging path; only a clean run with output
/// present is committed under the final name. The raw payload is consumed
/// either way: deleted after success, discarded after failure.
pub struct ConvertArtifactHandler {
    store: Arc<dyn ArtifactStore>,
    converter: Arc<dyn Converter>,
}

impl ConvertArtifactHandler {
    pub fn new(store: Arc<dyn ArtifactStore>, converter: Arc<dyn Converter>) -> Self {
        Self { store, converter }
    }

    pub async fn handle(
        &self,
        cmd: ConvertArtifactCommand,
    ) -> Result<ConvertArtifactResult, ConversionError> {
        let raw = cmd.raw;
        let identity = *raw.identity();
        let staging = self.store.staging_path(&identity);

        let converted = self.converter.convert(raw.path(), &staging).await;
        let committed = match converted {
            Ok(()) => self.store.commit_converted(&identity).await.map_err(|e| {
                if e.is_not_found() {
                    ConversionError::missing_output(staging.to_string_lossy())
                } else {
                    ConversionError::Storage(e)
                }
            }),
            Err(e) => Err(e),
        };

        if committed.is_err() {
            if let Err(e) = self.store.discard_staging(&identity).await {
                tracing::warn!(identity = %identity, error = %e, "Failed to remove staged output");
            }
        }

        if let Err(e) = self.store.discard_raw(raw).await {
            tracing::warn!(identity = %identity, error = %e, "Failed to delete raw payload");
        }

        let artifact = committed?;
        tracing::debug!(identity = %identity, bytes = artifact.size_bytes, "Converted");
        Ok(ConvertArtifactResult { artifact })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalArtifactStore;
    use crate::domain::cycle::Identity;
    use crate::ports::{FilePath, RemotePayload};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes fixed content to the output path, or fails with a non-zero exit.
    struct MockConverter {
        output: Option<&'static str>,
        calls: Mutex<Vec<(FilePath, FilePath)>>,
    }

    impl MockConverter {
        fn writing(content: &'static str) -> Self {
            Self {
                output: Some(content),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                output: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Converter for MockConverter {
        async fn convert(&self, raw: &FilePath, output: &FilePath) -> Result<(), ConversionError> {
            self.calls
                .lock()
                .unwrap()
                .push((raw.clone(), output.clone()));
            match self.output {
                Some(content) => {
                    tokio::fs::write(output.as_path(), content).await.unwrap();
                    Ok(())
                }
                None => {
                    tokio::fs::write(output.as_path(), "partial").await.unwrap();
                    Err(ConversionError::NonZeroExit {
                        status: "exit code 1".to_string(),
                        stderr: "corrupt".to_string(),
                    })
                }
            }
        }
    }

    async fn setup() -> (Arc<LocalArtifactStore>, RawArtifact, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(LocalArtifactStore::new(
            temp.path().join("grib-data"),
            temp.path().join("json-data"),
        ));
        store.ensure_dirs().await.unwrap();
        let identity: Identity = "2024-03-01T06.f003".parse().unwrap();
        let raw = store
            .write_raw(&identity, RemotePayload::from_bytes(200, "GRIB").body)
            .await
            .unwrap();
        (store, raw, temp)
    }

    #[tokio::test]
    async fn success_commits_output_and_deletes_raw() {
        let (store, raw, _temp) = setup().await;
        let raw_path = raw.path().clone();
        let identity = *raw.identity();
        let converter = Arc::new(MockConverter::writing("[]"));
        let handler = ConvertArtifactHandler::new(store.clone(), converter.clone());

        let result = handler.handle(ConvertArtifactCommand { raw }).await.unwrap();

        assert_eq!(result.artifact.identity, identity);
        assert!(store.converted_exists(&identity).await.unwrap());
        assert!(!raw_path.as_path().exists());

        let calls = converter.calls.lock().unwrap();
        assert_eq!(calls[0].0, raw_path);
        assert_eq!(calls[0].1, store.staging_path(&identity));
    }

    #[tokio::test]
    async fn failure_leaves_no_converted_artifact() {
        let (store, raw, _temp) = setup().await;
        let raw_path = raw.path().clone();
        let identity = *raw.identity();
        let handler = ConvertArtifactHandler::new(store.clone(), Arc::new(MockConverter::failing()));

        let err = handler.handle(ConvertArtifactCommand { raw }).await.unwrap_err();

        assert!(matches!(err, ConversionError::NonZeroExit { .. }));
        assert!(!store.converted_exists(&identity).await.unwrap());
        assert!(!store.staging_path(&identity).as_path().exists());
        assert!(!raw_path.as_path().exists());
    }
}
