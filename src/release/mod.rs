/// Resolution of the `latest` stable Kubernetes release
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::utils::retry::RetryPolicy;

/// One response from the stable pointer URL
#[derive(Debug, Clone)]
pub struct PointerResponse {
    pub status: StatusCode,
    pub body: String,
}

impl PointerResponse {
    fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Fetches the stable release pointer with bounded retries
#[derive(Clone)]
pub struct StableVersionResolver {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl StableVersionResolver {
    pub fn new(url: impl Into<String>, retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            retry,
        })
    }

    /// Resolve `latest` to a concrete version string
    ///
    /// Stops at the first 200 response. When every attempt returns another
    /// status, the body of the last response is used anyway; the caller then
    /// sees it as a version that does not match.
    pub async fn resolve_latest(&self) -> Result<String> {
        info!("checking latest version");

        let response = self
            .retry
            .retry_until(
                "Fetching latest version info",
                || self.fetch(),
                PointerResponse::is_ok,
            )
            .await?;

        if !response.is_ok() {
            debug!(
                "Giving up on {} after status {}, using last response body",
                self.url, response.status
            );
        }

        Ok(response.body.trim().to_string())
    }

    async fn fetch(&self) -> Result<PointerResponse> {
        debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", self.url))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        let body = String::from_utf8(bytes.to_vec()).context("Response body is not UTF-8")?;

        Ok(PointerResponse { status, body })
    }
}
