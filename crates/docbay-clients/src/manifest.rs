//! Manifest retrieval over plain HTTP.

use std::time::Duration;

use async_trait::async_trait;
use docbay_core::{CollaboratorResult, ManifestFetcher};
use tracing::debug;

use crate::error::{from_reqwest, from_response};
use crate::USER_AGENT;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches package manifests from their public raw-content URL.
pub struct HttpManifestFetcher {
    http_client: reqwest::Client,
}

impl HttpManifestFetcher {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        HttpManifestFetcher { http_client }
    }
}

impl Default for HttpManifestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> CollaboratorResult<Vec<u8>> {
        debug!(url = %url, "fetching manifest");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(from_reqwest)?;

        // An absent manifest comes back as `NotFound`, which callers treat
        // as "this branch carries no documentation".
        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        let bytes = response.bytes().await.map_err(from_reqwest)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbay_core::CollaboratorError;

    #[tokio::test]
    async fn unreachable_host_fails_with_a_network_error() {
        let fetcher = HttpManifestFetcher::new();
        let err = fetcher
            .fetch("http://127.0.0.1:9/composer.json")
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Network(_)), "got: {err}");
    }
}
