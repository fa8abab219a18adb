//! CSV dataset storage
//!
//! One file per (symbol, interval): `{dir}/{symbol}-{interval}.csv`. The
//! header row starts with an empty cell for the row index column, followed
//! by the twelve candle columns.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{MarketError, Result};
use crate::table::{CandleRow, CandleTable, Timestamp, TimestampFormat, COLUMNS};

/// Reads and writes candle tables under one directory
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        CsvStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str, interval: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.csv", symbol, interval))
    }

    pub fn exists(&self, symbol: &str, interval: &str) -> bool {
        self.path_for(symbol, interval).is_file()
    }

    /// Write the table, replacing any previous file for the same key
    pub fn save(&self, symbol: &str, interval: &str, table: &CandleTable) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(symbol, interval);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(std::iter::once("").chain(COLUMNS))?;

        for (index, row) in table.rows().iter().enumerate() {
            let index = index.to_string();
            let fields = row.fields();
            writer.write_record(
                std::iter::once(index.as_str()).chain(fields.iter().map(String::as_str)),
            )?;
        }
        writer.flush()?;

        info!("Saved {} rows to {}", table.len(), path.display());
        Ok(path)
    }

    /// Load the stored table for a key; `DatasetNotFound` when no file exists
    pub fn load(&self, symbol: &str, interval: &str) -> Result<CandleTable> {
        let path = self.path_for(symbol, interval);
        if !path.is_file() {
            return Err(MarketError::DatasetNotFound(path));
        }
        let table = read_table(&path)?;
        debug!("Loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}

fn read_table(path: &Path) -> Result<CandleTable> {
    let invalid = |message: String| MarketError::InvalidDataset {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let expected = std::iter::once("").chain(COLUMNS);
    if headers.len() != COLUMNS.len() + 1 || !headers.iter().eq(expected) {
        return Err(invalid(format!("unexpected header {:?}", headers)));
    }

    let mut rows = Vec::new();
    let mut format: Option<TimestampFormat> = None;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let field = |col: usize| record.get(col + 1).unwrap_or_default();

        let number = |col: usize| -> Result<f64> { parse(field(col), col, row_idx, &invalid) };
        let timestamp = |col: usize| -> Result<Timestamp> {
            Timestamp::parse(field(col)).ok_or_else(|| {
                invalid(format!(
                    "row {}: bad {} value '{}'",
                    row_idx,
                    COLUMNS[col],
                    field(col)
                ))
            })
        };

        let row = CandleRow {
            open_time: timestamp(0)?,
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close: number(4)?,
            volume: number(5)?,
            close_time: timestamp(6)?,
            quote_asset_volume: number(7)?,
            number_of_trades: parse(field(8), 8, row_idx, &invalid)?,
            taker_buy_base_asset_volume: number(9)?,
            taker_buy_quote_asset_volume: number(10)?,
            ignore: field(11).to_string(),
        };

        let row_format = row.open_time.format();
        if row.close_time.format() != row_format || format.is_some_and(|f| f != row_format) {
            return Err(invalid(format!("row {}: mixed timestamp formats", row_idx)));
        }
        format = Some(row_format);

        rows.push(row);
    }

    Ok(CandleTable::from_rows(format.unwrap_or_default(), rows))
}

fn parse<T: FromStr>(
    text: &str,
    col: usize,
    row_idx: usize,
    invalid: &impl Fn(String) -> MarketError,
) -> Result<T> {
    text.trim().parse().map_err(|_| {
        invalid(format!(
            "row {}: bad {} value '{}'",
            row_idx, COLUMNS[col], text
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;
    use std::env::temp_dir;

    fn candles(n: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                open_time: 1_700_000_000_000 + i * 3_600_000,
                open: 35000.0 + i as f64,
                high: 35100.5,
                low: 34900.25,
                close: 35050.125,
                volume: 12.345678,
                close_time: 1_700_000_000_000 + (i + 1) * 3_600_000 - 1,
                quote_volume: 432_100.5,
                trades: 1200 + i as u64,
                taker_buy_base: 6.1,
                taker_buy_quote: 213_500.75,
                ignore: "0".to_string(),
            })
            .collect()
    }

    fn store(name: &str) -> CsvStore {
        let dir = temp_dir().join(format!("symbol_klines_store_{}", name));
        fs::remove_dir_all(&dir).ok();
        CsvStore::new(dir)
    }

    #[test]
    fn test_path_convention() {
        let store = CsvStore::new("data");
        assert_eq!(
            store.path_for("BTCUSDT", "1h"),
            PathBuf::from("data").join("BTCUSDT-1h.csv")
        );
    }

    #[test]
    fn test_save_and_load_epoch_millis() {
        let store = store("millis");
        let table = CandleTable::from_candles(&candles(5), TimestampFormat::EpochMillis);

        let path = store.save("BTCUSDT", "1h", &table).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with(",Open time,Open,High,Low,Close,Volume,Close time"));
        assert!(text.lines().nth(1).unwrap().starts_with("0,1700000000000,35000,"));

        let loaded = store.load("BTCUSDT", "1h").unwrap();
        assert_eq!(loaded, table);

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_save_and_load_date_times() {
        let store = store("datetime");
        let table = CandleTable::from_candles(&candles(3), TimestampFormat::DateTime);
        store.save("ETHUSDT", "1h", &table).unwrap();

        let loaded = store.load("ETHUSDT", "1h").unwrap();
        assert_eq!(loaded.timestamp_format(), TimestampFormat::DateTime);
        assert_eq!(loaded, table);

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_missing_dataset() {
        let store = store("missing");
        assert!(!store.exists("BTCUSDT", "1d"));
        assert!(matches!(
            store.load("BTCUSDT", "1d"),
            Err(MarketError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_mixed_stamps_in_first_row() {
        let store = store("mixed_first_row");
        let table = CandleTable::from_candles(&candles(2), TimestampFormat::EpochMillis);
        let path = store.save("BTCUSDT", "1h", &table).unwrap();

        let text = fs::read_to_string(&path)
            .unwrap()
            .replacen("0,1700000000000,", "0,2023-11-14 22:13:20.000,", 1);
        fs::write(&path, text).unwrap();

        assert!(matches!(
            store.load("BTCUSDT", "1h"),
            Err(MarketError::InvalidDataset { .. })
        ));

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_unrepresentable_date_time_is_rejected_on_load() {
        let store = store("unrepresentable");
        let mut rows = candles(1);
        rows[0].close_time = i64::MAX;
        let table = CandleTable::from_candles(&rows, TimestampFormat::DateTime);
        store.save("BTCUSDT", "1h", &table).unwrap();

        assert!(matches!(
            store.load("BTCUSDT", "1h"),
            Err(MarketError::InvalidDataset { .. })
        ));

        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_rejects_foreign_csv() {
        let store = store("foreign");
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path_for("BTCUSDT", "1d"),
            "datetime,open,high,low,close,volume\n2024-01-01 00:00:00,1,2,0.5,1.5,10\n",
        )
        .unwrap();

        assert!(matches!(
            store.load("BTCUSDT", "1d"),
            Err(MarketError::InvalidDataset { .. })
        ));

        fs::remove_dir_all(store.dir()).ok();
    }
}
