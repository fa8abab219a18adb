//! Core data types used across the crate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MarketError, Result};

/// Kline/candlestick record
///
/// The exchange returns each kline as a 12 element array:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_buy_base, taker_buy_quote, ignore]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trades: u64,
    pub taker_buy_base: f64,
    pub taker_buy_quote: f64,
    pub ignore: String,
}

impl Candle {
    /// Number of fields in a raw kline row
    pub const FIELDS: usize = 12;

    /// Parse from the raw JSON array returned by the klines endpoint
    pub fn from_raw(raw: &[Value]) -> Option<Self> {
        if raw.len() < Self::FIELDS {
            return None;
        }

        Some(Candle {
            open_time: raw[0].as_i64()?,
            open: float(&raw[1])?,
            high: float(&raw[2])?,
            low: float(&raw[3])?,
            close: float(&raw[4])?,
            volume: float(&raw[5])?,
            close_time: raw[6].as_i64()?,
            quote_volume: float(&raw[7])?,
            trades: raw[8].as_u64()?,
            taker_buy_base: float(&raw[9])?,
            taker_buy_quote: float(&raw[10])?,
            ignore: match &raw[11] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
    }
}

/// Prices and volumes come back as strings, but accept plain numbers too
fn float(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Exchange-imposed constraint on valid prices or quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    PriceFilter {
        min_price: Decimal,
        max_price: Decimal,
        tick_size: Decimal,
    },

    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        min_qty: Decimal,
        max_qty: Decimal,
        step_size: Decimal,
    },

    /// Filter types the formatter has no use for
    #[serde(other)]
    Other,
}

/// Symbol metadata as reported by `exchangeInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

impl SymbolInfo {
    pub fn is_trading(&self) -> bool {
        self.status == "TRADING"
    }
}

/// One price level of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Decimal, Decimal)", into = "(Decimal, Decimal)")]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl From<(Decimal, Decimal)> for BookLevel {
    fn from((price, quantity): (Decimal, Decimal)) -> Self {
        BookLevel { price, quantity }
    }
}

impl From<BookLevel> for (Decimal, Decimal) {
    fn from(level: BookLevel) -> Self {
        (level.price, level.quantity)
    }
}

/// Order book snapshot: asks ascending by price, bids descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    #[serde(default)]
    pub last_update_id: u64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// The side that has no resting orders, if any
    pub fn empty_side(&self) -> Option<&'static str> {
        if self.asks.is_empty() {
            Some("asks")
        } else if self.bids.is_empty() {
            Some("bids")
        } else {
            None
        }
    }
}

/// Current average price over the exchange's rolling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragePrice {
    pub mins: u32,
    pub price: Decimal,
}

/// Valid kline intervals
pub const INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

/// Check if interval is a valid kline interval
pub fn is_valid_interval(interval: &str) -> bool {
    INTERVALS.contains(&interval)
}

pub fn validate_interval(interval: &str) -> Result<()> {
    if is_valid_interval(interval) {
        Ok(())
    } else {
        Err(MarketError::InvalidInterval(interval.to_string()))
    }
}
