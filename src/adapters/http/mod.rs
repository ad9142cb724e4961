//! HTTP adapters - REST API implementations.
//!
//! `build_router` wraps the retrieval routes in the cross-cutting layers
//! every endpoint shares.

pub mod retrieval;

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use retrieval::{retrieval_router, RetrievalAppState, IDENTITY_HEADER};

/// Complete application router with CORS, compression, tracing and a request timeout.
///
/// An empty `cors_origins` allows any origin.
pub fn build_router(
    state: RetrievalAppState,
    cors_origins: &[String],
    request_timeout: Duration,
) -> Router {
    retrieval_router()
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(cors_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .expose_headers([HeaderName::from_static(IDENTITY_HEADER)]);

    if cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(origins = ?cors_origins, "CORS: allowing configured origins");
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}
