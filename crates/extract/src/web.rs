use pptmaker_common::{PptMakerError, Result};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::postprocess::strip_markup;

/// Fetches web pages as plain text
#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    /// Create fetcher; every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pptmaker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PptMakerError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// GET `url` and strip markup from the body.
    ///
    /// Transport errors, timeouts and non-2xx statuses are
    /// [`PptMakerError::SourceUnavailable`].
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        info!("Fetching {}", url);
        let unavailable = |reason: String| PptMakerError::source_unavailable(url, reason);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                unavailable("request timed out".to_string())
            } else {
                unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| unavailable(e.to_string()))?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(strip_markup(&body))
    }
}

/// Host name used to label web sources
pub fn host_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
