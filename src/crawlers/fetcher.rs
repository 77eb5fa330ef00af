use crate::config::RunConfig;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Errors a fetcher can report for a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webdriver error: {0}")]
    WebDriver(String),
    #[error("timed out fetching {0}")]
    Timeout(String),
}

impl FetchError {
    /// Whether trying the same URL again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Request(e) => e.is_timeout() || e.is_connect(),
            FetchError::Timeout(_) => true,
            FetchError::InvalidUrl(_) | FetchError::WebDriver(_) => false,
        }
    }
}

/// Turns a URL into a page body. Retries, sessions and proxies live behind
/// this interface; the crawler only sees a body or an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Longest a single `fetch` call may take, retries included. Fetchers that
    /// bound their own requests report it so callers do not cut retries short.
    fn fetch_budget(&self) -> Option<Duration> {
        None
    }

    /// Release held resources once the crawl is over
    async fn close(&self) {}
}

/// Fetcher issuing plain HTTP requests with reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
    request_timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher honouring the proxy, timeout and retry settings
    pub fn new(config: &RunConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let request_timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(request_timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(&proxy.url)
                .map_err(|e| FetchError::InvalidUrl(format!("proxy {}: {}", proxy.url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            max_retries: config.max_request_retries,
            retry_base: Duration::from_millis(500),
            request_timeout,
        })
    }

    /// Override the first backoff delay; later retries double it
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_base * 2u32.saturating_pow(attempt - 1);
                    ::log::warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Every attempt at its full timeout plus every backoff delay
    fn fetch_budget(&self) -> Option<Duration> {
        let attempts = self.max_retries.saturating_add(1);
        let backoffs = 2u32.saturating_pow(self.max_retries).saturating_sub(1);
        Some(
            self.request_timeout
                .saturating_mul(attempts)
                .saturating_add(self.retry_base.saturating_mul(backoffs)),
        )
    }
}
