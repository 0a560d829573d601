// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote collaborators: the artifact source and the freshness signal.
//!
//! Both are plain GETs. The artifact is consumed as opaque bytes; no format
//! beyond "resolves to a loadable model or fails" is assumed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed freshness signal: {0}")]
    MalformedSignal(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Network(err.to_string())
    }
}

/// Remote-side timestamp describing the latest published artifact.
///
/// Transient; fetched on demand and never persisted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FreshnessSignal {
    pub last_updated: DateTime<Utc>,
}

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetches the serialized model artifact as opaque bytes.
    async fn fetch_artifact(&self, locator: &str) -> Result<Vec<u8>, RemoteError>;

    /// Fetches the freshness signal for the published artifact.
    async fn fetch_freshness(&self, locator: &str) -> Result<FreshnessSignal, RemoteError>;
}

/// HTTP implementation of [`RemoteSource`].
///
/// No request timeout is configured: a fetch that never resolves is
/// cancellable only by process teardown.
pub struct HttpRemoteSource {
    client: Client,
}

impl HttpRemoteSource {
    pub fn new() -> Result<Self, RemoteError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_artifact(&self, locator: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.client.get(locator).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(locator, size_bytes = bytes.len(), "artifact fetched");
        Ok(bytes.to_vec())
    }

    async fn fetch_freshness(&self, locator: &str) -> Result<FreshnessSignal, RemoteError> {
        let response = self.client.get(locator).send().await?.error_for_status()?;
        let signal = response
            .json::<FreshnessSignal>()
            .await
            .map_err(|e| RemoteError::MalformedSignal(e.to_string()))?;
        debug!(locator, last_updated = %signal.last_updated, "freshness signal fetched");
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_signal_parses_iso_8601() {
        let signal: FreshnessSignal =
            serde_json::from_str(r#"{"last_updated": "2025-06-01T12:00:00Z"}"#).unwrap();
        assert_eq!(
            signal.last_updated,
            "2025-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn freshness_signal_rejects_garbage() {
        let result = serde_json::from_str::<FreshnessSignal>(r#"{"last_updated": "soon"}"#);
        assert!(result.is_err());
    }
}
