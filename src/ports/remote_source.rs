//! Remote Source Port - upstream publisher of raw model output.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use std::pin::Pin;
use thiserror::Error;

use crate::domain::cycle::Identity;

/// Body of a remote response, delivered in chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// Port for fetching one raw payload per identity.
///
/// Non-success statuses are returned as a payload, not an error, so callers
/// can tell "not yet published" apart from a broken connection.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Issues the request for `identity`.
    async fn fetch(&self, identity: &Identity) -> Result<RemotePayload, FetchError>;

    /// Human-readable location of `identity`, for logs.
    fn describe(&self, identity: &Identity) -> String;
}

/// Status and body of a remote response.
pub struct RemotePayload {
    pub status: u16,
    pub body: ByteStream,
}

impl RemotePayload {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Payload whose body is a single in-memory chunk.
    pub fn from_bytes(status: u16, bytes: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, FetchError> = Ok(bytes.into());
        Self::new(status, Box::pin(stream::iter(vec![chunk])))
    }

    /// Only a 200 counts as published data.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

impl std::fmt::Debug for RemotePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemotePayload")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Errors from the upstream request itself.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The body stream broke mid-transfer.
    #[error("Body error: {0}")]
    Body(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network(message.into())
    }

    pub fn body(message: impl Into<String>) -> Self {
        FetchError::Body(message.into())
    }
}
