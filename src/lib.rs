//! Symbol-centric market data for Binance spot
//!
//! Resolves a trading pair, snapshots its order book, formats prices and
//! quantities against the exchange filters, and downloads long candle
//! histories page by page into CSV datasets.
//!
//! ## Example
//! ```no_run
//! use symbol_klines::{
//!     dataset, BinanceClient, CsvStore, DatasetRequest, FetchConfig, KlineFetcher, NoProgress,
//!     SymbolSpec,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let fetcher = KlineFetcher::new(BinanceClient::new()?, FetchConfig::default());
//!     let store = CsvStore::new("data");
//!     let request = DatasetRequest {
//!         symbol: SymbolSpec::from_currency_pair("btc", "usdt"),
//!         interval: "1h".to_string(),
//!         end_time: chrono::Utc::now().timestamp_millis(),
//!         count: 2500,
//!         download: true,
//!     };
//!     let table = dataset::obtain(&fetcher, &store, &request, &mut NoProgress)?;
//!     println!("{} rows", table.len());
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod config;
pub mod dataset;
pub mod error;
pub mod exchange;
pub mod fetcher;
pub mod format;
pub mod pacer;
pub mod progress;
pub mod store;
pub mod symbol;
pub mod table;
pub mod types;

pub use binance::BinanceClient;
pub use config::Config;
pub use dataset::{obtain, DatasetRequest};
pub use error::{MarketError, Result};
pub use exchange::ExchangeClient;
pub use fetcher::{stitch, FetchConfig, KlineFetcher};
pub use format::StepRule;
pub use progress::{NoProgress, ProgressSink};
pub use store::CsvStore;
pub use symbol::{Symbol, SymbolSpec};
pub use table::{CandleRow, CandleTable, Timestamp, TimestampFormat, COLUMNS};
pub use types::*;
