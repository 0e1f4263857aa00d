//! Remote version fetching

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use depot_core::models::RemoteCredentials;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Remote repository rejected the credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("Remote repository returned HTTP {status}")]
    Status { status: u16 },

    #[error("Fetch timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Source of historical version bytes
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, uri: &str, credentials: &RemoteCredentials) -> Result<Bytes, FetchError>;
}

/// Fetches versions over HTTP with basic authentication
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str, credentials: &RemoteCredentials) -> Result<Bytes, FetchError> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(uri)
            .basic_auth(credentials.username(), Some(credentials.secret()))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        tracing::debug!(
            uri = %uri,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched remote version"
        );
        Ok(body)
    }
}
