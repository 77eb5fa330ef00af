use clap::Parser;
use recipe_harvest::RunConfig;
use recipe_harvest::config::{FetcherConfig, ProxyConfig, StartUrl};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recipe-harvest")]
#[command(about = "Crawler that harvests structured recipes from allrecipes listing and search pages")]
#[command(version)]
pub struct Args {
    /// JSON run configuration; command-line options override its values
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,

    /// Search query used when no start URL is given
    #[arg(short, long)]
    pub query: Option<String>,

    /// Listing page to start from (repeatable, replaces the query)
    #[arg(short = 'u', long = "start-url")]
    pub start_urls: Vec<String>,

    /// Maximum number of recipes to save (0 for unbounded)
    #[arg(short = 'n', long)]
    pub results: Option<usize>,

    /// Maximum listing pages to follow
    #[arg(short = 'p', long)]
    pub max_pages: Option<u32>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Proxy URL for all requests
    #[arg(long)]
    pub proxy: Option<String>,

    /// Fetch pages through the WebDriver server at this URL instead of plain HTTP
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Only synthesize a next listing page when the page shows pagination
    #[arg(long)]
    pub no_always_advance: bool,

    /// Write JSON Lines here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Build the run configuration from the optional file plus command-line overrides
    pub fn run_config(&self) -> Result<RunConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(query) = &self.query {
            config.query = query.clone();
        }
        if !self.start_urls.is_empty() {
            config.start_urls = self
                .start_urls
                .iter()
                .map(|url| StartUrl::Plain(url.clone()))
                .collect();
        }
        if let Some(results) = self.results {
            config.results_wanted = (results > 0).then_some(results);
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(ProxyConfig { url: proxy.clone() });
        }
        if let Some(webdriver_url) = &self.webdriver {
            config.fetcher = FetcherConfig::WebDriver {
                webdriver_url: webdriver_url.clone(),
            };
        }
        if self.no_always_advance {
            config.always_advance = false;
        }

        Ok(config)
    }
}
