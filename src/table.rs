//! Typed candle table
//!
//! Converts fetched candles into rows with fixed, named columns. The bulk
//! download path keeps open/close times as epoch milliseconds; the recent
//! candles path converts them to UTC date-times.

use chrono::{DateTime, NaiveDateTime, Utc};
use itertools::Itertools;
use std::fmt;

use crate::types::Candle;

/// Column names, in file order
pub const COLUMNS: [&str; 12] = [
    "Open time",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Close time",
    "Quote asset volume",
    "Number of trades",
    "Taker buy base asset volume",
    "Taker buy quote asset volume",
    "Ignore",
];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// How open and close times are represented in a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    #[default]
    EpochMillis,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Millis(i64),
    DateTime(DateTime<Utc>),
}

impl Timestamp {
    /// Stamp `ms` in the requested format
    ///
    /// Values chrono cannot represent as a date-time (hundreds of millennia
    /// away from the epoch) stay `Millis` even when `DateTime` is asked for.
    /// A table holding such a row is reported as mixed when loaded back.
    pub fn from_millis(ms: i64, format: TimestampFormat) -> Self {
        match format {
            TimestampFormat::EpochMillis => Timestamp::Millis(ms),
            TimestampFormat::DateTime => DateTime::from_timestamp_millis(ms)
                .map(Timestamp::DateTime)
                .unwrap_or(Timestamp::Millis(ms)),
        }
    }

    pub fn as_millis(&self) -> i64 {
        match self {
            Timestamp::Millis(ms) => *ms,
            Timestamp::DateTime(dt) => dt.timestamp_millis(),
        }
    }

    pub fn format(&self) -> TimestampFormat {
        match self {
            Timestamp::Millis(_) => TimestampFormat::EpochMillis,
            Timestamp::DateTime(_) => TimestampFormat::DateTime,
        }
    }

    /// Parse either an integer epoch-ms value or a `YYYY-MM-DD HH:MM:SS[.fff]` UTC date-time
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(ms) = text.parse::<i64>() {
            return Some(Timestamp::Millis(ms));
        }
        NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .map(|naive| Timestamp::DateTime(naive.and_utc()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Millis(ms) => write!(f, "{}", ms),
            Timestamp::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

/// One table row, field order matching [`COLUMNS`]
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRow {
    pub open_time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: Timestamp,
    pub quote_asset_volume: f64,
    pub number_of_trades: u64,
    pub taker_buy_base_asset_volume: f64,
    pub taker_buy_quote_asset_volume: f64,
    pub ignore: String,
}

impl CandleRow {
    pub fn from_candle(candle: &Candle, format: TimestampFormat) -> Self {
        CandleRow {
            open_time: Timestamp::from_millis(candle.open_time, format),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            close_time: Timestamp::from_millis(candle.close_time, format),
            quote_asset_volume: candle.quote_volume,
            number_of_trades: candle.trades,
            taker_buy_base_asset_volume: candle.taker_buy_base,
            taker_buy_quote_asset_volume: candle.taker_buy_quote,
            ignore: candle.ignore.clone(),
        }
    }

    /// Cell values in column order
    pub fn fields(&self) -> [String; 12] {
        [
            self.open_time.to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            self.close_time.to_string(),
            self.quote_asset_volume.to_string(),
            self.number_of_trades.to_string(),
            self.taker_buy_base_asset_volume.to_string(),
            self.taker_buy_quote_asset_volume.to_string(),
            self.ignore.clone(),
        ]
    }
}

/// Ordered candle rows with a fixed schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleTable {
    format: TimestampFormat,
    rows: Vec<CandleRow>,
}

impl CandleTable {
    /// Rows are taken in the given order, without sorting or deduplication
    pub fn from_candles(candles: &[Candle], format: TimestampFormat) -> Self {
        CandleTable {
            format,
            rows: candles
                .iter()
                .map(|c| CandleRow::from_candle(c, format))
                .collect(),
        }
    }

    pub fn from_rows(format: TimestampFormat, rows: Vec<CandleRow>) -> Self {
        CandleTable { format, rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        self.format
    }

    pub fn rows(&self) -> &[CandleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Open time of the first and last row, in epoch ms
    pub fn time_range(&self) -> Option<(i64, i64)> {
        Some((
            self.rows.first()?.open_time.as_millis(),
            self.rows.last()?.open_time.as_millis(),
        ))
    }

    /// True when open times strictly increase from row to row
    pub fn is_chronological(&self) -> bool {
        self.rows
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.open_time.as_millis() < b.open_time.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64) -> Candle {
        Candle {
            open_time,
            open: 100.5,
            high: 101.25,
            low: 99.75,
            close: 100.0,
            volume: 12.5,
            close_time: open_time + 59_999,
            quote_volume: 1250.0,
            trades: 42,
            taker_buy_base: 6.0,
            taker_buy_quote: 600.0,
            ignore: "0".to_string(),
        }
    }

    #[test]
    fn test_epoch_millis_table() {
        let candles = vec![candle(1_609_459_200_000), candle(1_609_459_260_000)];
        let table = CandleTable::from_candles(&candles, TimestampFormat::EpochMillis);

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), 12);
        let row = &table.rows()[0];
        assert_eq!(row.open_time, Timestamp::Millis(1_609_459_200_000));
        assert_eq!(row.number_of_trades, 42);
        assert_eq!(row.fields()[0], "1609459200000");
        assert_eq!(row.fields()[6], "1609459259999");
        assert!(table.is_chronological());
    }

    #[test]
    fn test_date_time_table() {
        let table = CandleTable::from_candles(&[candle(1_609_459_200_000)], TimestampFormat::DateTime);
        let row = &table.rows()[0];

        assert_eq!(row.open_time.to_string(), "2021-01-01 00:00:00.000");
        assert_eq!(row.close_time.to_string(), "2021-01-01 00:00:59.999");
        assert_eq!(row.close_time.as_millis(), 1_609_459_259_999);
    }

    #[test]
    fn test_unrepresentable_date_time_stays_millis() {
        assert_eq!(
            Timestamp::from_millis(i64::MAX, TimestampFormat::DateTime),
            Timestamp::Millis(i64::MAX)
        );
    }

    #[test]
    fn test_keeps_input_order() {
        let candles = vec![candle(120_000), candle(60_000), candle(60_000)];
        let table = CandleTable::from_candles(&candles, TimestampFormat::EpochMillis);
        assert_eq!(table.len(), 3);
        assert!(!table.is_chronological());
        assert_eq!(table.time_range(), Some((120_000, 60_000)));
    }

    #[test]
    fn test_timestamp_parse() {
        assert_eq!(Timestamp::parse("1500"), Some(Timestamp::Millis(1500)));
        let parsed = Timestamp::parse("2021-01-01 00:00:59.999").unwrap();
        assert_eq!(parsed.as_millis(), 1_609_459_259_999);
        assert_eq!(parsed.format(), TimestampFormat::DateTime);
        assert!(Timestamp::parse("yesterday").is_none());
    }
}
