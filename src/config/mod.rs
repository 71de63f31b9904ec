//! Scraper configuration.
//!
//! All tuning knobs live here: timeouts, pacing bounds, the user-agent pool,
//! block-page markers, and the storefront base URL. Loaded from an explicit
//! TOML path or `~/.config/cartgrab/config.toml`; missing fields fall back to
//! the defaults below. Locator chains are deliberately NOT configurable —
//! their order is part of the extraction contract.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{CartgrabError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Storefront base URL; product URLs are `<base_url>/dp/<identifier>`
    pub base_url: String,

    /// Page navigation timeout in seconds (default: 30)
    pub nav_timeout_secs: u64,

    /// Bounded wait for the product title element before extracting (default: 10)
    pub title_wait_secs: u64,

    /// Inter-request pacing delay bounds in seconds, sampled uniformly
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,

    /// Maximum identifiers looked up per call; overflow is dropped with a warning
    pub max_batch_size: usize,

    /// Page bodies shorter than this are classified as blocked (default: 5000)
    pub min_page_length: usize,

    /// Body substrings that mark an error or robot-check page
    pub block_markers: Vec<String>,

    /// User-agent pool; one entry is chosen at random per browsing context
    pub user_agents: Vec<String>,

    /// Browsing context fingerprint: viewport, locale, timezone
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            base_url: "https://www.amazon.com".to_string(),
            nav_timeout_secs: 30,
            title_wait_secs: 10,
            delay_min_secs: 2.0,
            delay_max_secs: 5.0,
            max_batch_size: 10,
            min_page_length: 5000,
            block_markers: vec![
                "Something went wrong".to_string(),
                "Type the characters you see in this image".to_string(),
                "Enter the characters you see below".to_string(),
                "automated access".to_string(),
            ],
            user_agents: vec![
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36"
                    .to_string(),
            ],
            viewport_width: 1920,
            viewport_height: 1080,
            locale: "en-US".to_string(),
            timezone: "America/New_York".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from the given path, or from the default path if it
    /// exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_config_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| CartgrabError::Config(format!("{}: {e}", path.display())))
    }

    /// `~/.config/cartgrab/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CartgrabError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("cartgrab").join("config.toml"))
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn title_wait(&self) -> Duration {
        Duration::from_secs(self.title_wait_secs)
    }

    /// Canonical product URL for an identifier.
    pub fn product_url(&self, identifier: &str) -> String {
        format!("{}/dp/{identifier}", self.base_url.trim_end_matches('/'))
    }
}
