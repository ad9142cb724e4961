//! Axum router configuration for retrieval endpoints.

use axum::{routing::get, Router};

use super::handlers::{index, latest, nearest, RetrievalAppState};

/// Create the retrieval router.
///
/// # Routes
/// - `GET /` - Short HTML pointer to `/latest`
/// - `GET /latest` - Cached item closest to now
/// - `GET /nearest?time=<ISO-8601>&limit=<hours>&direction=<backward|forward>`
pub fn retrieval_router() -> Router<RetrievalAppState> {
    Router::new()
        .route("/", get(index))
        .route("/latest", get(latest))
        .route("/nearest", get(nearest))
}
