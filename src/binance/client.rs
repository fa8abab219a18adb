//! Blocking Binance client for symbol metadata, order books and klines
//!
//! # Example
//! ```no_run
//! use symbol_klines::binance::BinanceClient;
//! use symbol_klines::ExchangeClient;
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new()?;
//!     let klines = client.get_klines("BTCUSDT", "1h", 100, None)?;
//!     println!("Fetched {} klines", klines.len());
//!     Ok(())
//! }
//! ```

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{ApiErrorBody, ExchangeInfoResponse, INVALID_SYMBOL};
use crate::config::ExchangeConfig;
use crate::error::{MarketError, Result};
use crate::exchange::ExchangeClient;
use crate::types::{AveragePrice, Candle, OrderBook, SymbolInfo};

/// Base URL for Binance API
pub const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";

/// Maximum klines per request (Binance limit)
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Binance API client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    order_book_depth: u32,
}

impl BinanceClient {
    /// Create a client against the public endpoint with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&ExchangeConfig::default())
    }

    pub fn with_config(config: &ExchangeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MarketError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(BinanceClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            order_book_depth: config.order_book_depth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send()?;
        let response = check_status(response)?;
        Ok(response.json()?)
    }
}

/// Turn non-2xx responses into `ExchangeRejected`, keeping Binance's error code
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(err) => (Some(err.code), err.msg),
        Err(_) => (None, body),
    };

    Err(MarketError::ExchangeRejected {
        status: status.as_u16(),
        code,
        message,
    })
}

impl ExchangeClient for BinanceClient {
    fn get_symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        debug!("Fetching exchange info: symbol={}", symbol);

        let params = [("symbol", symbol.to_string())];
        match self.get_json::<ExchangeInfoResponse>("exchangeInfo", &params) {
            Ok(info) => Ok(info.symbols.into_iter().find(|s| s.symbol == symbol)),
            Err(MarketError::ExchangeRejected {
                code: Some(INVALID_SYMBOL),
                ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_order_book(&self, symbol: &str) -> Result<OrderBook> {
        debug!(
            "Fetching order book: symbol={}, depth={}",
            symbol, self.order_book_depth
        );

        let params = [
            ("symbol", symbol.to_string()),
            ("limit", self.order_book_depth.to_string()),
        ];
        self.get_json("depth", &params)
    }

    fn get_average_price(&self, symbol: &str) -> Result<AveragePrice> {
        let params = [("symbol", symbol.to_string())];
        self.get_json("avgPrice", &params)
    }

    fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        let limit = limit.clamp(1, MAX_KLINES_PER_REQUEST);

        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_time {
            params.push(("endTime", end.to_string()));
        }

        debug!(
            "Fetching klines: symbol={}, interval={}, limit={}, end_time={:?}",
            symbol, interval, limit, end_time
        );

        let raw_data: Vec<Vec<Value>> = self.get_json("klines", &params)?;

        raw_data
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Candle::from_raw(row).ok_or_else(|| {
                    warn!("Malformed kline row {} for {}: {:?}", i, symbol, row);
                    MarketError::InvalidResponse(format!("malformed kline row {}", i))
                })
            })
            .collect()
    }
}
