//! NOMADS remote source - Implementation of RemoteSource over reqwest.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use std::time::Duration;

use super::NomadsQuery;
use crate::domain::cycle::Identity;
use crate::ports::{FetchError, RemotePayload, RemoteSource};

/// Fetches raw payloads from the NOMADS grib filter.
pub struct NomadsSource {
    query: NomadsQuery,
    client: Client,
}

impl NomadsSource {
    /// Creates a source with a per-request timeout.
    pub fn new(query: NomadsQuery, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { query, client })
    }

    /// Full request URL for `identity`.
    pub fn url(&self, identity: &Identity) -> Result<Url, FetchError> {
        Url::parse_with_params(&self.query.endpoint, self.query.params(identity))
            .map_err(|e| FetchError::InvalidRequest(format!("Invalid endpoint: {}", e)))
    }
}

#[async_trait]
impl RemoteSource for NomadsSource {
    async fn fetch(&self, identity: &Identity) -> Result<RemotePayload, FetchError> {
        let url = self.url(identity)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::network(format!("Request timed out: {}", e))
            } else {
                FetchError::network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetchError::body(format!("Stream error: {}", e))));

        Ok(RemotePayload::new(status, Box::pin(body)))
    }

    fn describe(&self, identity: &Identity) -> String {
        self.url(identity)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.query.file_name(identity))
    }
}
