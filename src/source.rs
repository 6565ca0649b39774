//! Status endpoint access
//!
//! HTTP transport for the poller. Failures are folded into a small
//! taxonomy so the poll loop can log and display them uniformly without
//! caring which layer broke.

use crate::snapshot::Snapshot;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use thiserror::Error;

/// Where snapshots come from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch one snapshot. Called at most once at a time by the poller.
    async fn fetch(&self) -> Result<Snapshot, SourceError>;
}

/// Configuration for the HTTP status source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Full URL of the status endpoint
    pub url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/gen_change".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// HTTP status source backed by reqwest.
pub struct HttpSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> Self {
        // Status reads must never be served from a cache
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot, SourceError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
            });
        }

        response.json::<Snapshot>().await.map_err(classify)
    }
}

fn classify(error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout
    } else if error.is_connect() {
        SourceError::Unavailable
    } else {
        SourceError::Request(error)
    }
}

/// Errors fetching a snapshot from the status endpoint
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("status endpoint unavailable")]
    Unavailable,

    #[error("request timeout")]
    Timeout,

    #[error("status endpoint returned HTTP {status}")]
    Http { status: u16 },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
