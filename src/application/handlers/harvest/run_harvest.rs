//! RunHarvestHandler - drives one harvest lineage to completion.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{ConvertArtifactCommand, ConvertArtifactHandler};
use crate::domain::cycle::{identity_for, ForecastOffset, Identity};
use crate::domain::harvest::{
    self, HarvestEffect, HarvestError, HarvestEvent, HarvestPolicy, HarvestState,
};
use crate::ports::{ArtifactStore, Clock, RawArtifact, RemoteSource};

/// Command to run one harvest lineage.
#[derive(Debug, Clone, Default)]
pub struct RunHarvestCommand {
    /// Seed timestamp; the clock's current time when absent.
    pub start: Option<DateTime<Utc>>,
}

/// Summary of a finished lineage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Identity the lineage started from.
    pub seed: Option<Identity>,
    /// Every identity the lineage considered, in order.
    pub attempted: Vec<Identity>,
    /// Identities newly converted during this run.
    pub converted: Vec<Identity>,
    /// Identities skipped because they were already cached.
    pub already_cached: usize,
    /// Non-200 responses, network failures and unstorable bodies.
    pub fetch_failures: usize,
    pub conversion_failures: usize,
}

/// Handler that runs the harvest state machine against the real ports.
///
/// Fetch and conversion failures are outcomes, not errors: they feed the
/// machine's decide-next rule. Only an inconsistent machine or an unusable
/// cache directory ends the run with an error.
pub struct RunHarvestHandler {
    store: Arc<dyn ArtifactStore>,
    source: Arc<dyn RemoteSource>,
    converter: Arc<ConvertArtifactHandler>,
    clock: Arc<dyn Clock>,
    policy: HarvestPolicy,
}

impl RunHarvestHandler {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        source: Arc<dyn RemoteSource>,
        converter: Arc<ConvertArtifactHandler>,
        clock: Arc<dyn Clock>,
        policy: HarvestPolicy,
    ) -> Self {
        Self {
            store,
            source,
            converter,
            clock,
            policy,
        }
    }

    pub async fn handle(&self, cmd: RunHarvestCommand) -> Result<HarvestReport, HarvestError> {
        self.store
            .ensure_dirs()
            .await
            .map_err(|e| HarvestError::storage(e.to_string()))?;

        let seed = identity_for(
            cmd.start.unwrap_or_else(|| self.clock.now()),
            ForecastOffset::ZERO,
        );
        tracing::info!(seed = %seed, "Harvest started");

        let mut report = HarvestReport {
            seed: Some(seed),
            ..HarvestReport::default()
        };
        let mut pending_raw: Option<RawArtifact> = None;
        let mut step = harvest::start(seed);

        while let Some(effect) = step.effect {
            let event = match effect {
                HarvestEffect::Fetch(identity) => {
                    report.attempted.push(identity);
                    let (event, raw) = self.fetch(&identity).await;
                    pending_raw = raw;
                    event
                }
                HarvestEffect::Convert(identity) => {
                    self.convert(identity, pending_raw.take()).await
                }
                HarvestEffect::Resume => HarvestEvent::Resumed,
            };

            match event {
                HarvestEvent::AlreadyCached => report.already_cached += 1,
                HarvestEvent::FetchFailed => report.fetch_failures += 1,
                HarvestEvent::ConversionFailed => report.conversion_failures += 1,
                HarvestEvent::Converted => {
                    if let Some(identity) = step.state.identity() {
                        report.converted.push(identity);
                    }
                }
                HarvestEvent::Fetched | HarvestEvent::Resumed => {}
            }

            step = harvest::transition(&step.state, event, &self.policy, self.clock.now())?;
            log_step(&step.state);
        }

        tracing::info!(
            seed = %seed,
            attempted = report.attempted.len(),
            converted = report.converted.len(),
            already_cached = report.already_cached,
            fetch_failures = report.fetch_failures,
            conversion_failures = report.conversion_failures,
            "Harvest complete"
        );
        Ok(report)
    }

    /// Skips cached identities, otherwise downloads the raw payload.
    async fn fetch(&self, identity: &Identity) -> (HarvestEvent, Option<RawArtifact>) {
        match self.store.converted_exists(identity).await {
            Ok(true) => {
                tracing::debug!(identity = %identity, "Already cached");
                return (HarvestEvent::AlreadyCached, None);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "Cache probe failed, fetching anyway");
            }
        }

        let payload = match self.source.fetch(identity).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    identity = %identity,
                    url = %self.source.describe(identity),
                    error = %e,
                    "Fetch failed"
                );
                return (HarvestEvent::FetchFailed, None);
            }
        };

        tracing::info!(identity = %identity, status = payload.status, "Remote responded");
        if !payload.is_success() {
            return (HarvestEvent::FetchFailed, None);
        }

        match self.store.write_raw(identity, payload.body).await {
            Ok(raw) => (HarvestEvent::Fetched, Some(raw)),
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "Failed to store raw payload");
                (HarvestEvent::FetchFailed, None)
            }
        }
    }

    async fn convert(&self, identity: Identity, raw: Option<RawArtifact>) -> HarvestEvent {
        let Some(raw) = raw else {
            tracing::error!(identity = %identity, "No raw payload to convert");
            return HarvestEvent::ConversionFailed;
        };

        match self.converter.handle(ConvertArtifactCommand { raw }).await {
            Ok(_) => HarvestEvent::Converted,
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "Conversion failed");
                HarvestEvent::ConversionFailed
            }
        }
    }
}

fn log_step(state: &HarvestState) {
    match state {
        HarvestState::Advancing(next) => tracing::debug!(next = %next, "Advancing"),
        HarvestState::RollingBack(next) => tracing::debug!(next = %next, "Rolling back"),
        HarvestState::Done => tracing::debug!("Lineage reached history limit"),
        HarvestState::Fetching(_) | HarvestState::Converting(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::storage::LocalArtifactStore;
    use crate::ports::{
        ByteStream, ConversionError, ConvertedListing, Converter, FetchError, FilePath,
        RemotePayload, StorageError, StoredArtifact,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves 200 for identities in `published`, 404 otherwise.
    struct MockRemoteSource {
        published: HashSet<String>,
        requests: Mutex<Vec<String>>,
        network_down: bool,
    }

    impl MockRemoteSource {
        fn publishing(identities: &[&str]) -> Self {
            Self {
                published: identities.iter().map(|s| s.to_string()).collect(),
                requests: Mutex::new(Vec::new()),
                network_down: false,
            }
        }

        fn offline() -> Self {
            Self {
                published: HashSet::new(),
                requests: Mutex::new(Vec::new()),
                network_down: true,
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteSource for MockRemoteSource {
        async fn fetch(&self, identity: &Identity) -> Result<RemotePayload, FetchError> {
            let key = identity.to_string();
            self.requests.lock().unwrap().push(key.clone());
            if self.network_down {
                return Err(FetchError::network("connection refused"));
            }
            if self.published.contains(&key) {
                Ok(RemotePayload::from_bytes(200, key.into_bytes()))
            } else {
                Ok(RemotePayload::from_bytes(404, ""))
            }
        }

        fn describe(&self, identity: &Identity) -> String {
            format!("mock://{}", identity)
        }
    }

    /// Copies the raw bytes into a JSON string, failing for listed identities.
    struct MockConverter {
        broken: HashSet<String>,
    }

    #[async_trait]
    impl Converter for MockConverter {
        async fn convert(&self, raw: &FilePath, output: &FilePath) -> Result<(), ConversionError> {
            let name = raw.file_name().unwrap_or_default();
            if self.broken.contains(&name) {
                return Err(ConversionError::spawn("broken"));
            }
            let bytes = tokio::fs::read(raw.as_path()).await.unwrap();
            let json = format!("{:?}", String::from_utf8_lossy(&bytes));
            tokio::fs::write(output.as_path(), json).await.unwrap();
            Ok(())
        }
    }

    /// Local store whose existence check always fails.
    struct UnreadableCacheStore(LocalArtifactStore);

    #[async_trait]
    impl ArtifactStore for UnreadableCacheStore {
        async fn ensure_dirs(&self) -> Result<(), StorageError> {
            self.0.ensure_dirs().await
        }
        async fn converted_exists(&self, _identity: &Identity) -> Result<bool, StorageError> {
            Err(StorageError::permission_denied("json-data"))
        }
        fn converted_path(&self, identity: &Identity) -> FilePath {
            self.0.converted_path(identity)
        }
        fn staging_path(&self, identity: &Identity) -> FilePath {
            self.0.staging_path(identity)
        }
        async fn write_raw(
            &self,
            identity: &Identity,
            body: ByteStream,
        ) -> Result<RawArtifact, StorageError> {
            self.0.write_raw(identity, body).await
        }
        async fn discard_raw(&self, artifact: RawArtifact) -> Result<(), StorageError> {
            self.0.discard_raw(artifact).await
        }
        async fn purge_raw(&self) -> Result<usize, StorageError> {
            self.0.purge_raw().await
        }
        async fn commit_converted(&self, identity: &Identity) -> Result<StoredArtifact, StorageError> {
            self.0.commit_converted(identity).await
        }
        async fn discard_staging(&self, identity: &Identity) -> Result<(), StorageError> {
            self.0.discard_staging(identity).await
        }
        async fn list_converted(&self) -> Result<ConvertedListing, StorageError> {
            self.0.list_converted().await
        }
        async fn read_converted(&self, identity: &Identity) -> Result<Bytes, StorageError> {
            self.0.read_converted(identity).await
        }
        async fn delete_converted(&self, identity: &Identity) -> Result<(), StorageError> {
            self.0.delete_converted(identity).await
        }
    }

    struct Fixture {
        handler: RunHarvestHandler,
        store: Arc<LocalArtifactStore>,
        source: Arc<MockRemoteSource>,
        _temp: TempDir,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap()
    }

    fn fixture(source: MockRemoteSource, broken: &[&str]) -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(LocalArtifactStore::new(
            temp.path().join("grib-data"),
            temp.path().join("json-data"),
        ));
        let source = Arc::new(source);
        let converter = Arc::new(ConvertArtifactHandler::new(
            store.clone(),
            Arc::new(MockConverter {
                broken: broken.iter().map(|s| s.to_string()).collect(),
            }),
        ));
        let handler = RunHarvestHandler::new(
            store.clone(),
            source.clone(),
            converter,
            Arc::new(FixedClock::new(now())),
            HarvestPolicy::new(1, 18),
        );
        Fixture {
            handler,
            store,
            source,
            _temp: temp,
        }
    }

    fn names(ids: &[Identity]) -> Vec<String> {
        ids.iter().map(|i| i.to_string()).collect()
    }

    fn full_cycle(cycle: &str) -> Vec<String> {
        (0..=7).map(|step| format!("{}.f{:03}", cycle, step * 3)).collect()
    }

    #[tokio::test]
    async fn unpublished_seed_rolls_back_to_previous_cycle() {
        let published = full_cycle("2024-03-01T00");
        let refs: Vec<&str> = published.iter().map(|s| s.as_str()).collect();
        let f = fixture(MockRemoteSource::publishing(&refs), &[]);

        let report = f.handler.handle(RunHarvestCommand::default()).await.unwrap();

        let requests = f.source.requests();
        assert_eq!(requests[0], "2024-03-01T06.f000");
        assert_eq!(requests[1], "2024-03-01T00.f000");
        assert_eq!(requests[2], "2024-03-01T00.f003");
        assert_eq!(names(&report.converted), published);
        assert_eq!(report.seed.unwrap().to_string(), "2024-03-01T06.f000");
        for name in &published {
            assert!(f.store.converted_exists(&name.parse().unwrap()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn harvest_never_crosses_history_window() {
        let f = fixture(MockRemoteSource::publishing(&[]), &[]);

        let report = f.handler.handle(RunHarvestCommand::default()).await.unwrap();

        assert_eq!(
            names(&report.attempted),
            vec![
                "2024-03-01T06.f000",
                "2024-03-01T00.f000",
                "2024-02-29T18.f000",
                "2024-02-29T12.f000",
            ]
        );
        assert_eq!(report.fetch_failures, 4);
        assert!(report.converted.is_empty());
    }

    #[tokio::test]
    async fn cached_identities_are_not_fetched_again() {
        let published = full_cycle("2024-03-01T06");
        let refs: Vec<&str> = published.iter().map(|s| s.as_str()).collect();
        let f = fixture(MockRemoteSource::publishing(&refs), &[]);

        let first = f.handler.handle(RunHarvestCommand::default()).await.unwrap();
        let requests_after_first = f.source.requests().len();
        let second = f.handler.handle(RunHarvestCommand::default()).await.unwrap();

        assert_eq!(first.converted.len(), 8);
        assert!(second.converted.is_empty());
        assert_eq!(second.already_cached, 8);

        let new_requests: Vec<String> = f.source.requests()[requests_after_first..].to_vec();
        assert!(new_requests.iter().all(|r| !published.contains(r)));
    }

    #[tokio::test]
    async fn conversion_failure_rolls_back() {
        let f = fixture(
            MockRemoteSource::publishing(&["2024-03-01T06.f000", "2024-03-01T06.f003"]),
            &["2024-03-01T06.f003"],
        );

        let report = f.handler.handle(RunHarvestCommand::default()).await.unwrap();

        assert_eq!(names(&report.converted), vec!["2024-03-01T06.f000"]);
        assert_eq!(report.conversion_failures, 1);
        assert_eq!(report.attempted[2].to_string(), "2024-03-01T00.f000");
        assert!(!f
            .store
            .converted_exists(&"2024-03-01T06.f003".parse().unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn network_errors_are_outcomes_not_errors() {
        let f = fixture(MockRemoteSource::offline(), &[]);

        let report = f.handler.handle(RunHarvestCommand::default()).await.unwrap();

        assert_eq!(report.fetch_failures, report.attempted.len());
        assert!(!report.attempted.is_empty());
    }

    #[tokio::test]
    async fn failed_cache_check_still_fetches() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn ArtifactStore> = Arc::new(UnreadableCacheStore(LocalArtifactStore::new(
            temp.path().join("grib-data"),
            temp.path().join("json-data"),
        )));
        let source = Arc::new(MockRemoteSource::publishing(&["2024-03-01T06.f000"]));
        let converter = Arc::new(ConvertArtifactHandler::new(
            store.clone(),
            Arc::new(MockConverter {
                broken: HashSet::new(),
            }),
        ));
        let handler = RunHarvestHandler::new(
            store,
            source.clone(),
            converter,
            Arc::new(FixedClock::new(now())),
            HarvestPolicy::new(1, 18),
        );

        let report = handler.handle(RunHarvestCommand::default()).await.unwrap();

        assert_eq!(source.requests()[0], "2024-03-01T06.f000");
        assert_eq!(report.already_cached, 0);
        assert_eq!(names(&report.converted), vec!["2024-03-01T06.f000"]);
        assert!(temp.path().join("json-data/2024-03-01T06.f000.json").exists());
    }

    #[tokio::test]
    async fn explicit_start_seeds_the_lineage() {
        let f = fixture(MockRemoteSource::publishing(&[]), &[]);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap();

        let report = f
            .handler
            .handle(RunHarvestCommand { start: Some(start) })
            .await
            .unwrap();

        assert_eq!(report.seed.unwrap().to_string(), "2024-03-01T00.f000");
    }
}
