use crate::crawlers::fetcher::{FetchError, Fetcher};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use tokio::sync::Mutex;

/// WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Fetcher driving a browser over WebDriver.
///
/// Sessions are opened lazily and pooled, so each concurrent fetch uses its
/// own browser session.
pub struct WebDriverFetcher {
    webdriver_url: String,
    idle: Mutex<Vec<Client>>,
}

impl WebDriverFetcher {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Take an idle session or open a new one
    async fn checkout(&self) -> Result<Client, FetchError> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Ok(client);
        }
        connect_to_webdriver(&self.webdriver_url).await
    }

    async fn checkin(&self, client: Client) {
        self.idle.lock().await.push(client);
    }
}

#[async_trait]
impl Fetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let client = self.checkout().await?;

        match page_source(&client, url).await {
            Ok(source) => {
                self.checkin(client).await;
                Ok(source)
            }
            Err(e) if e.to_string().contains("Unable to find session") => {
                // The session died under us; reconnect once and retry
                ::log::warn!("Lost WebDriver session while fetching {}, reconnecting", url);
                let client = connect_to_webdriver(&self.webdriver_url).await?;
                let result = page_source(&client, url)
                    .await
                    .map_err(|e| FetchError::WebDriver(e.to_string()));
                self.checkin(client).await;
                result
            }
            Err(e) => {
                self.checkin(client).await;
                Err(FetchError::WebDriver(format!("failed to load {}: {}", url, e)))
            }
        }
    }

    async fn close(&self) {
        let clients: Vec<Client> = self.idle.lock().await.drain(..).collect();
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

async fn page_source(client: &Client, url: &str) -> Result<String, fantoccini::error::CmdError> {
    client.goto(url).await?;
    client.source().await
}

/// Connects to the WebDriver instance, trying common alternatives on failure
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client, FetchError> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(FetchError::WebDriver(format!(
        "no WebDriver server reachable at {} or fallbacks",
        webdriver_url
    )))
}
