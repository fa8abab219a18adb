//! Configuration management
//!
//! Loads an optional JSON configuration file. Every section has defaults, so
//! an empty `{}` (or no file at all) is a valid configuration. A `.env` file
//! and environment variables can override the API endpoint and data
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::binance::{BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
use crate::fetcher::{FetchConfig, MIN_PAGE_SIZE};

/// Overrides `exchange.base_url`
pub const ENV_API_BASE: &str = "SYMBOL_KLINES_API_BASE";
/// Overrides `download.data_dir`
pub const ENV_DATA_DIR: &str = "SYMBOL_KLINES_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file {}", path.as_ref().display())
        })?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Load from `path` when given (defaults otherwise), then apply `.env`
    /// and environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Config::default(),
        };

        if let Ok(base_url) = std::env::var(ENV_API_BASE) {
            config.exchange.base_url = base_url;
        }
        if let Ok(data_dir) = std::env::var(ENV_DATA_DIR) {
            config.download.data_dir = PathBuf::from(data_dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.download.max_page_size < MIN_PAGE_SIZE {
            anyhow::bail!(
                "download.max_page_size must be at least {}, got {}",
                MIN_PAGE_SIZE,
                self.download.max_page_size
            );
        }
        if !self.download.request_delay_secs.is_finite() || self.download.request_delay_secs < 0.0
        {
            anyhow::bail!(
                "download.request_delay_secs must be a non-negative number, got {}",
                self.download.request_delay_secs
            );
        }
        if self.exchange.timeout_secs == 0 {
            anyhow::bail!("exchange.timeout_secs must be positive");
        }
        Ok(())
    }
}

/// Exchange endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// HTTP request timeout; a request that exceeds it fails with `ExchangeTimeout`
    pub timeout_secs: u64,
    pub order_book_depth: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            base_url: BINANCE_API_BASE.to_string(),
            timeout_secs: 30,
            order_book_depth: 100,
        }
    }
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bulk download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub data_dir: PathBuf,
    /// Pause before every kline request, in seconds
    pub request_delay_secs: f64,
    pub max_page_size: usize,
    /// Whether the last page request of a download is also delayed
    pub delay_final_page: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            data_dir: PathBuf::from("data"),
            request_delay_secs: 1.0,
            max_page_size: MAX_KLINES_PER_REQUEST,
            delay_final_page: true,
        }
    }
}

impl DownloadConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_page_size: self.max_page_size,
            request_delay: self.request_delay(),
            delay_final_page: self.delay_final_page,
        }
    }
}
