//! HTTP handlers for retrieval endpoints.
//!
//! These handlers connect Axum routes to the nearest-match query handler and
//! stream the matching converted artifact back as JSON.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::application::handlers::retrieval::{
    FindNearestHandler, FindNearestQuery, NearestArtifact,
};
use crate::domain::retrieval::{RetrievalError, SearchDirection};
use crate::ports::{ArtifactStore, Clock};

use super::dto::{ErrorResponse, NearestParams};

/// Response header naming the identity that was served.
pub const IDENTITY_HEADER: &str = "x-forecast-identity";

const INDEX_PAGE: &str = "<!DOCTYPE html>\n<html><head><title>GFS archive</title></head>\
<body><p>Latest wind data: <a href=\"/latest\">/latest</a></p>\
<p>Closest match: <code>/nearest?time=2024-03-01T06:00Z&amp;limit=18</code></p></body></html>\n";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the retrieval endpoints.
#[derive(Clone)]
pub struct RetrievalAppState {
    pub store: Arc<dyn ArtifactStore>,
    pub clock: Arc<dyn Clock>,
    /// Search limit used when a request does not carry one.
    pub default_limit_hours: u32,
}

impl RetrievalAppState {
    pub fn new(store: Arc<dyn ArtifactStore>, clock: Arc<dyn Clock>, default_limit_hours: u32) -> Self {
        Self {
            store,
            clock,
            default_limit_hours,
        }
    }

    pub fn find_nearest_handler(&self) -> FindNearestHandler {
        FindNearestHandler::new(self.store.clone(), self.clock.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Pointer to the data endpoints
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// GET /latest - Cached item closest to now
pub async fn latest(State(state): State<RetrievalAppState>) -> Result<Response, RetrievalApiError> {
    let query = FindNearestQuery {
        target: None,
        limit_hours: state.default_limit_hours,
        direction: SearchDirection::Backward,
    };
    serve(&state, query).await
}

/// GET /nearest?time=..&limit=..&direction=.. - Cached item closest to `time`
pub async fn nearest(
    State(state): State<RetrievalAppState>,
    Query(params): Query<NearestParams>,
) -> Result<Response, RetrievalApiError> {
    let query = FindNearestQuery {
        target: Some(params.target()?),
        limit_hours: params.limit_hours(state.default_limit_hours)?,
        direction: params.direction()?,
    };
    serve(&state, query).await
}

async fn serve(state: &RetrievalAppState, query: FindNearestQuery) -> Result<Response, RetrievalApiError> {
    let target = query.target.unwrap_or_else(|| state.clock.now());
    let limit_hours = query.limit_hours;

    let found = state.find_nearest_handler().handle(query).await?;
    let body = read_artifact(state, &found, target, limit_hours).await?;

    tracing::debug!(
        identity = %found.identity,
        valid_time = %found.identity.valid_time(),
        %target,
        bytes = body.len(),
        "Serving converted artifact"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (HeaderName::from_static(IDENTITY_HEADER), found.identity.to_string()),
        ],
        body,
    )
        .into_response())
}

async fn read_artifact(
    state: &RetrievalAppState,
    found: &NearestArtifact,
    target: DateTime<Utc>,
    limit_hours: u32,
) -> Result<Bytes, RetrievalError> {
    match state.store.read_converted(&found.identity).await {
        Ok(body) => Ok(body),
        // Evicted between the probe and the read.
        Err(e) if e.is_not_found() => Err(RetrievalError::not_found(target, limit_hours)),
        Err(e) => Err(RetrievalError::storage(e.to_string())),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts retrieval errors to HTTP responses.
#[derive(Debug)]
pub struct RetrievalApiError(RetrievalError);

impl From<RetrievalError> for RetrievalApiError {
    fn from(err: RetrievalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RetrievalApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RetrievalError::FutureBeyondLimit { .. } | RetrievalError::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            RetrievalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RetrievalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Retrieval failed");
        }

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        if let RetrievalError::FutureBeyondLimit { limit_hours, .. }
        | RetrievalError::NotFound { limit_hours, .. } = &self.0
        {
            body = body.with_details(serde_json::json!({ "limit_hours": limit_hours }));
        }
        (status, Json(body)).into_response()
    }
}
