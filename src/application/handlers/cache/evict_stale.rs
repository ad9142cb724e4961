//! EvictStaleHandler - deletes converted artifacts whose cycle has aged out.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::cycle::Identity;
use crate::ports::{ArtifactStore, Clock, StorageError};

/// Command to sweep the converted area.
#[derive(Debug, Clone, Copy)]
pub struct EvictStaleCommand {
    /// Artifacts whose cycle is strictly older than this are deleted.
    pub threshold_days: u32,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub deleted: Vec<Identity>,
    pub retained: usize,
    /// Artifacts that were stale but could not be deleted.
    pub failed: Vec<Identity>,
    /// Files in the converted area whose names are not identities.
    pub skipped: Vec<String>,
}

/// Handler for the staleness sweep.
///
/// Age comes from the cycle embedded in each file's identity, never from
/// filesystem timestamps.
pub struct EvictStaleHandler {
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
}

impl EvictStaleHandler {
    pub fn new(store: Arc<dyn ArtifactStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn handle(&self, cmd: EvictStaleCommand) -> Result<EvictionReport, StorageError> {
        let now = self.clock.now();
        let threshold = Duration::days(i64::from(cmd.threshold_days));
        let listing = self.store.list_converted().await?;

        let mut report = EvictionReport {
            skipped: listing.unrecognized,
            ..EvictionReport::default()
        };
        for name in &report.skipped {
            tracing::warn!(file = %name, "Skipping unrecognized file in cache");
        }

        for artifact in listing.artifacts {
            let identity = artifact.identity;
            if identity.age_at(now) <= threshold {
                report.retained += 1;
                continue;
            }

            match self.store.delete_converted(&identity).await {
                Ok(()) => report.deleted.push(identity),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    tracing::warn!(identity = %identity, error = %e, "Failed to evict");
                    report.failed.push(identity);
                }
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            retained = report.retained,
            failed = report.failed.len(),
            "Cleanup complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::ports::{
        ByteStream, ConvertedListing, FilePath, RawArtifact, StoredArtifact,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Converted area held in memory; deletes of listed identities fail.
    struct MockArtifactStore {
        artifacts: Mutex<Vec<Identity>>,
        unrecognized: Vec<String>,
        undeletable: HashSet<Identity>,
    }

    impl MockArtifactStore {
        fn with(names: &[&str]) -> Self {
            Self {
                artifacts: Mutex::new(names.iter().map(|n| n.parse().unwrap()).collect()),
                unrecognized: Vec::new(),
                undeletable: HashSet::new(),
            }
        }

        fn remaining(&self) -> Vec<String> {
            self.artifacts
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl ArtifactStore for MockArtifactStore {
        async fn ensure_dirs(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn converted_exists(&self, identity: &Identity) -> Result<bool, StorageError> {
            Ok(self.artifacts.lock().unwrap().contains(identity))
        }

        fn converted_path(&self, identity: &Identity) -> FilePath {
            FilePath::new(format!("/mem/{}.json", identity))
        }

        fn staging_path(&self, identity: &Identity) -> FilePath {
            FilePath::new(format!("/mem/{}.json.tmp", identity))
        }

        async fn write_raw(
            &self,
            _identity: &Identity,
            _body: ByteStream,
        ) -> Result<RawArtifact, StorageError> {
            Err(StorageError::io("not supported"))
        }

        async fn discard_raw(&self, _artifact: RawArtifact) -> Result<(), StorageError> {
            Ok(())
        }

        async fn purge_raw(&self) -> Result<usize, StorageError> {
            Ok(0)
        }

        async fn commit_converted(&self, identity: &Identity) -> Result<StoredArtifact, StorageError> {
            Err(StorageError::not_found(identity.to_string()))
        }

        async fn discard_staging(&self, _identity: &Identity) -> Result<(), StorageError> {
            Ok(())
        }

        async fn list_converted(&self) -> Result<ConvertedListing, StorageError> {
            let artifacts = self
                .artifacts
                .lock()
                .unwrap()
                .iter()
                .map(|id| StoredArtifact::new(*id, self.converted_path(id), 2))
                .collect();
            Ok(ConvertedListing {
                artifacts,
                unrecognized: self.unrecognized.clone(),
            })
        }

        async fn read_converted(&self, _identity: &Identity) -> Result<Bytes, StorageError> {
            Ok(Bytes::from_static(b"[]"))
        }

        async fn delete_converted(&self, identity: &Identity) -> Result<(), StorageError> {
            if self.undeletable.contains(identity) {
                return Err(StorageError::permission_denied(identity.to_string()));
            }
            self.artifacts.lock().unwrap().retain(|i| i != identity);
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn handler(store: Arc<MockArtifactStore>) -> EvictStaleHandler {
        EvictStaleHandler::new(store, Arc::new(FixedClock::new(now())))
    }

    #[tokio::test]
    async fn deletes_only_artifacts_older_than_threshold() {
        let store = Arc::new(MockArtifactStore::with(&[
            "2024-03-08T12.f000",
            "2024-03-09T06.f018",
            "2024-03-09T12.f000",
            "2024-03-10T06.f003",
        ]));

        let report = handler(store.clone())
            .handle(EvictStaleCommand { threshold_days: 1 })
            .await
            .unwrap();

        assert_eq!(
            report.deleted.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
            vec!["2024-03-08T12.f000", "2024-03-09T06.f018"]
        );
        assert_eq!(report.retained, 2);
        assert_eq!(
            store.remaining(),
            vec!["2024-03-09T12.f000", "2024-03-10T06.f003"]
        );
    }

    #[tokio::test]
    async fn one_failed_delete_does_not_abort_sweep() {
        let mut store = MockArtifactStore::with(&[
            "2024-03-01T00.f000",
            "2024-03-02T00.f000",
            "2024-03-03T00.f000",
        ]);
        store.undeletable.insert("2024-03-02T00.f000".parse().unwrap());
        let store = Arc::new(store);

        let report = handler(store.clone())
            .handle(EvictStaleCommand { threshold_days: 1 })
            .await
            .unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.remaining(), vec!["2024-03-02T00.f000"]);
    }

    #[tokio::test]
    async fn unrecognized_files_are_reported_not_deleted() {
        let mut store = MockArtifactStore::with(&["2024-03-01T00.f000"]);
        store.unrecognized = vec!["README".to_string()];
        let store = Arc::new(store);

        let report = handler(store.clone())
            .handle(EvictStaleCommand { threshold_days: 1 })
            .await
            .unwrap();

        assert_eq!(report.skipped, vec!["README".to_string()]);
        assert_eq!(report.deleted.len(), 1);
    }

    #[tokio::test]
    async fn zero_threshold_keeps_only_current_cycle() {
        let store = Arc::new(MockArtifactStore::with(&[
            "2024-03-10T06.f000",
            "2024-03-10T12.f000",
        ]));

        let report = handler(store.clone())
            .handle(EvictStaleCommand { threshold_days: 0 })
            .await
            .unwrap();

        assert_eq!(store.remaining(), vec!["2024-03-10T12.f000"]);
        assert_eq!(report.retained, 1);
    }
}
