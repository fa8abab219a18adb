//! Binance spot REST client for public market data
//! No API key needed for the endpoints used here.

mod client;
mod types;

pub use client::{BinanceClient, BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
pub use types::ApiErrorBody;
