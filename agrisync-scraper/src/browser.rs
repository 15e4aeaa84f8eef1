//! Scoped WebDriver browser session
//!
//! [`BrowserSession`] owns one headless Chrome session behind chromedriver.
//! Callers release it with [`BrowserSession::close`] on every path; if a
//! session is dropped without that (panic, early return), `Drop` schedules
//! the close on the current runtime so the browser process does not leak.

use crate::error::SyncResult;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Chrome flags that keep headless Chrome stable in containers
const CHROME_ARGS: &[&str] = &[
    "--headless=new",
    "--single-process",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-software-rasterizer",
];

/// Browser launch options
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// WebDriver endpoint, e.g. `http://localhost:9515`
    pub webdriver_url: String,
    /// Directory Chrome saves downloads into
    pub download_dir: PathBuf,
    pub headless: bool,
}

impl BrowserOptions {
    pub fn new(webdriver_url: impl Into<String>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            download_dir: download_dir.into(),
            headless: true,
        }
    }

    /// WebDriver capabilities for this launch
    pub fn capabilities(&self) -> Map<String, Value> {
        let args: Vec<&str> = CHROME_ARGS
            .iter()
            .copied()
            .filter(|arg| self.headless || !arg.starts_with("--headless"))
            .collect();

        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        // Native alert/confirm dialogs are accepted if nobody handles them first
        caps.insert("unhandledPromptBehavior".to_string(), json!("accept"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "prefs": {
                    "download.default_directory": self.download_dir.display().to_string(),
                    "download.prompt_for_download": false,
                    "download.directory_upgrade": true,
                    "safebrowsing.enabled": true,
                },
            }),
        );
        caps
    }
}

/// One live browser session; see module docs for the release contract
pub struct BrowserSession {
    client: Client,
    download_dir: PathBuf,
    closed: bool,
}

impl BrowserSession {
    /// Start a new WebDriver session
    pub async fn launch(options: &BrowserOptions) -> SyncResult<Self> {
        std::fs::create_dir_all(&options.download_dir)?;

        let client = ClientBuilder::native()
            .capabilities(options.capabilities())
            .connect(&options.webdriver_url)
            .await?;

        tracing::info!(webdriver = %options.webdriver_url, "Browser session started");
        Ok(Self {
            client,
            download_dir: options.download_dir.clone(),
            closed: false,
        })
    }

    /// WebDriver client of this session
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// End the WebDriver session; errors are logged, never returned
    pub async fn close(mut self) {
        self.closed = true;
        match self.client.clone().close().await {
            Ok(()) => tracing::info!("Browser session closed"),
            Err(e) => tracing::warn!("Failed to close browser session cleanly: {}", e),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let client = self.client.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Browser session dropped without close; closing in background");
                handle.spawn(async move {
                    if let Err(e) = client.close().await {
                        tracing::warn!("Background browser close failed: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("Browser session dropped outside a runtime; WebDriver session leaked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_accept_prompts_and_set_download_dir() {
        let options = BrowserOptions::new("http://localhost:9515", "/tmp/agrisync/downloads");
        let caps = options.capabilities();

        assert_eq!(caps["unhandledPromptBehavior"], "accept");
        let chrome = &caps["goog:chromeOptions"];
        assert_eq!(
            chrome["prefs"]["download.default_directory"],
            "/tmp/agrisync/downloads"
        );
        let args = chrome["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn test_headed_mode_drops_headless_flag() {
        let mut options = BrowserOptions::new("http://localhost:9515", "/tmp/d");
        options.headless = false;
        let caps = options.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a.as_str().unwrap().starts_with("--headless")));
    }
}
