//! HTTP adapter for retrieval endpoints.
//!
//! Exposes the cache via REST API:
//! - `GET /` - Pointer to `/latest`
//! - `GET /latest` - Converted artifact closest to now
//! - `GET /nearest` - Converted artifact closest to a requested time

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, NearestParams};
pub use handlers::{RetrievalApiError, RetrievalAppState, IDENTITY_HEADER};
pub use routes::retrieval_router;
