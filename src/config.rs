use crate::filter::UrlFilterConfig;
use crate::selectors::SelectorConfig;
use crate::utils::build_search_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating the run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("no seed URL could be derived from the configuration")]
    NoSeeds,
}

/// A start URL given either as a plain string or as `{ "url": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartUrl {
    Plain(String),
    Request { url: String },
}

impl StartUrl {
    pub fn url(&self) -> &str {
        match self {
            StartUrl::Plain(url) | StartUrl::Request { url } => url,
        }
    }
}

/// Proxy settings handed to the fetcher untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
}

/// Which fetcher turns URLs into page bodies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FetcherConfig {
    /// Plain HTTP requests
    #[default]
    Http,
    /// A WebDriver-controlled browser
    WebDriver {
        #[serde(default = "default_webdriver_url")]
        webdriver_url: String,
    },
}

/// Configuration for one harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Search query used when no start URLs are given
    #[serde(default = "default_query")]
    pub query: String,

    /// Explicit seed pages; when non-empty they replace the query
    #[serde(default)]
    pub start_urls: Vec<StartUrl>,

    /// Maximum number of records to emit (`None` for unbounded)
    #[serde(default = "default_results_wanted")]
    pub results_wanted: Option<usize>,

    /// Maximum listing page depth
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of concurrent workers
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries the HTTP fetcher performs per request
    #[serde(default = "default_max_request_retries")]
    pub max_request_retries: u32,

    /// Upper bound for fetching one page, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Synthesize a next listing page even when the page shows no pagination
    #[serde(default = "default_always_advance")]
    pub always_advance: bool,

    #[serde(default)]
    pub filter: UrlFilterConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_query() -> String {
    "Chicken".to_string()
}

fn default_results_wanted() -> Option<usize> {
    Some(50)
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_concurrency() -> usize {
    5
}

fn default_max_request_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_always_advance() -> bool {
    true
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            start_urls: Vec::new(),
            results_wanted: default_results_wanted(),
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            max_request_retries: default_max_request_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
            fetcher: FetcherConfig::default(),
            always_advance: default_always_advance(),
            filter: UrlFilterConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Record quota with values below one raised to one
    pub fn max_records(&self) -> Option<usize> {
        self.results_wanted.map(|n| n.max(1))
    }

    /// Listing depth cap, at least one page
    pub fn max_list_pages(&self) -> u32 {
        self.max_pages.max(1)
    }

    /// Seed listing URLs: the start URLs when given, otherwise the search page for the query
    pub fn seed_urls(&self) -> Result<Vec<String>, ConfigError> {
        let seeds: Vec<String> = if self.start_urls.is_empty() {
            vec![build_search_url(&self.query)]
        } else {
            self.start_urls
                .iter()
                .map(|s| s.url().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        if seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        Ok(seeds)
    }
}
