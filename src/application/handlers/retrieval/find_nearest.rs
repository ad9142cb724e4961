//! FindNearestHandler - query handler for nearest-match retrieval.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::cycle::Identity;
use crate::domain::retrieval::{RetrievalError, SearchDirection, SearchPlan};
use crate::ports::{ArtifactStore, Clock, FilePath};

/// Query for the cached item closest to a point in time.
#[derive(Debug, Clone)]
pub struct FindNearestQuery {
    /// Requested time; the clock's current time when absent.
    pub target: Option<DateTime<Utc>>,
    pub limit_hours: u32,
    pub direction: SearchDirection,
}

/// The cached item that answered a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestArtifact {
    pub identity: Identity,
    pub path: FilePath,
}

/// Handler that probes the cache along a search plan.
pub struct FindNearestHandler {
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
}

impl FindNearestHandler {
    pub fn new(store: Arc<dyn ArtifactStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn handle(&self, query: FindNearestQuery) -> Result<NearestArtifact, RetrievalError> {
        let now = self.clock.now();
        let target = query.target.unwrap_or(now);
        let plan = SearchPlan::new(target, query.limit_hours, query.direction, now)?;

        for identity in plan {
            tracing::debug!(identity = %identity, "Probing cache");
            let found = self
                .store
                .converted_exists(&identity)
                .await
                .map_err(|e| RetrievalError::storage(e.to_string()))?;
            if found {
                return Ok(NearestArtifact {
                    identity,
                    path: self.store.converted_path(&identity),
                });
            }
        }

        Err(RetrievalError::not_found(target, query.limit_hours))
    }
}
