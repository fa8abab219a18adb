//! Exchange client abstraction
//!
//! Everything that needs market data goes through [`ExchangeClient`], so the
//! resolver and the kline fetcher can run against the live REST API or an
//! in-memory fake.

use crate::error::Result;
use crate::types::{AveragePrice, Candle, OrderBook, SymbolInfo};

/// Blocking market-data operations consumed by the crate
pub trait ExchangeClient {
    /// Symbol metadata, or `None` when the exchange does not list the symbol
    fn get_symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>>;

    fn get_order_book(&self, symbol: &str) -> Result<OrderBook>;

    fn get_average_price(&self, symbol: &str) -> Result<AveragePrice>;

    /// Up to `limit` klines with open time at or before `end_time`, oldest first
    fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>>;
}

impl<C: ExchangeClient + ?Sized> ExchangeClient for &C {
    fn get_symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        (**self).get_symbol_info(symbol)
    }

    fn get_order_book(&self, symbol: &str) -> Result<OrderBook> {
        (**self).get_order_book(symbol)
    }

    fn get_average_price(&self, symbol: &str) -> Result<AveragePrice> {
        (**self).get_average_price(symbol)
    }

    fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>> {
        (**self).get_klines(symbol, interval, limit, end_time)
    }
}
