//! External directory API client
//!
//! Thin adapter over the upstream regional directory. One call, no retry
//! policy: backoff, if wanted, belongs to whoever triggers a sync.

use std::time::Duration;
use thiserror::Error;

use crate::models::RegionEntry;

const DIRECTORY_PATH: &str = "/v1/regionais";
const USER_AGENT: &str = concat!("regiond/", env!("CARGO_PKG_VERSION"));

/// Directory fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("directory request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("directory returned status {0}")]
    Status(u16),

    #[error("malformed directory payload: {0}")]
    Decode(String),
}

/// Client for the upstream regional directory
pub struct DirectoryClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the authoritative snapshot of (id, name) pairs
    ///
    /// The upstream contract is a JSON array of `{"id": int, "nome": string}`
    /// objects; anything else is a decode error.
    pub async fn fetch_directory(&self) -> Result<Vec<RegionEntry>, FetchError> {
        let url = format!("{}{}", self.base_url, DIRECTORY_PATH);

        tracing::debug!(url = %url, "Fetching regional directory");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let entries: Vec<RegionEntry> = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Decode(e.to_string())
                }
            })?;

        tracing::info!(count = entries.len(), "Fetched regional directory snapshot");

        Ok(entries)
    }
}
