//! Listing page retrieval.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, REFERER};
use tracing::{info, instrument, warn};

use super::error::{ActivityError, ActivityResult, NetworkError};
use crate::core::config::SourceConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";
const ACCEPT_LANGUAGE_ZH: &str = "zh-CN,zh;q=0.9";
const NO_CACHE: &str = "no-cache";

/// Something that can produce the raw listing page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieve the page body. A single attempt, no retries.
    async fn fetch_page(&self) -> Result<String, NetworkError>;
}

/// Fetches the listing over HTTP with a fixed header set and a hard timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher for the configured listing page.
    pub fn new(config: &SourceConfig) -> ActivityResult<Self> {
        let referer = HeaderValue::from_str(&config.page_url).map_err(|e| {
            ActivityError::invalid_source(format!("page URL `{}`: {e}", config.page_url))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_ZH));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        headers.insert(REFERER, referer);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ActivityError::invalid_source(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.page_url.clone(),
            timeout: config.timeout(),
        })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_page(&self) -> Result<String, NetworkError> {
        let started = Instant::now();

        let request = async {
            let response = self.client.get(&self.url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(NetworkError::status(status));
            }
            let body = response.text().await?;
            Ok::<_, NetworkError>(body)
        };

        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout(self.timeout)),
        };

        match &result {
            Ok(body) => info!(
                bytes = body.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Fetched listing page"
            ),
            Err(e) => warn!(reason = e.reason_code(), "Fetching listing page failed: {}", e),
        }

        result
    }
}
