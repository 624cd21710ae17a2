//! HTTP fetching

use crate::{extract, FetchConfig, LipiError, Page, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Fetcher for web pages
///
/// Performs a single GET per call. Redirects are followed and the final URL
/// is reported on the returned [`Page`]; retries are left to the caller
/// (see [`crate::retry`]).
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a new fetcher with custom configuration
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page by URL
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        let url = Url::parse(url)?;
        info!("Fetching: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify(e, &url))?;

        let final_url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(LipiError::StatusError {
                url: final_url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason(),
            });
        }

        let html = response.text().await.map_err(|e| classify(e, &url))?;
        if final_url != url {
            debug!("Redirected {} -> {}", url, final_url);
        }
        debug!("Fetched {} bytes from {}", html.len(), final_url);

        let title = extract::extract_title(&html);
        Ok(Page {
            url,
            final_url,
            title,
            html,
        })
    }
}

fn classify(error: reqwest::Error, url: &Url) -> LipiError {
    if error.is_timeout() {
        LipiError::Timeout {
            url: url.to_string(),
        }
    } else {
        LipiError::HttpError(error)
    }
}
