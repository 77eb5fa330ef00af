pub mod config;
pub mod crawlers;
pub mod filter;
pub mod parsers;
pub mod results;
pub mod selectors;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::RunConfig;
pub use results::RecipeRecord;

use config::FetcherConfig;
use crawlers::fetcher::{FetchError, Fetcher, HttpFetcher};
use crawlers::webdriver::WebDriverFetcher;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Main builder for a recipe harvesting run
pub struct Harvest {
    config: RunConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl Harvest {
    /// Create a new Harvest builder from a run configuration
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            fetcher: None,
        }
    }

    /// Load the run configuration from a JSON file
    pub fn from_config_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(RunConfig::from_file(path)?))
    }

    /// Set the number of concurrent workers
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the record quota (`None` for unbounded)
    pub fn with_results_wanted(mut self, results_wanted: Option<usize>) -> Self {
        self.config.results_wanted = results_wanted;
        self
    }

    /// Set the listing page depth cap
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Use a custom fetcher instead of the one named in the configuration
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Start the crawl and get a receiver for recipe records
    pub async fn generate(
        self,
    ) -> Result<mpsc::Receiver<RecipeRecord>, Box<dyn std::error::Error>> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => build_fetcher(&self.config)?,
        };
        let receiver = crawlers::web::start(&self.config, fetcher).await?;
        Ok(receiver)
    }
}

/// Build the fetcher named in the configuration
fn build_fetcher(config: &RunConfig) -> Result<Arc<dyn Fetcher>, FetchError> {
    match &config.fetcher {
        FetcherConfig::Http => Ok(Arc::new(HttpFetcher::new(config)?)),
        FetcherConfig::WebDriver { webdriver_url } => {
            // Override the WebDriver URL with an environment variable if provided
            let webdriver_url = match std::env::var("WEBDRIVER_URL") {
                Ok(url) if !url.is_empty() => url,
                _ => webdriver_url.clone(),
            };
            ::log::info!("Fetching pages through WebDriver at {}", webdriver_url);
            Ok(Arc::new(WebDriverFetcher::new(&webdriver_url)))
        }
    }
}
