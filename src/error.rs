//! Error types shared by every fallible operation in the crate

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving symbols, talking to the exchange, or
/// reading and writing stored datasets
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("order book for {symbol} has no {side}")]
    EmptyOrderBook { symbol: String, side: &'static str },

    #[error("{filter} not found for {symbol}")]
    FilterNotFound {
        symbol: String,
        filter: &'static str,
    },

    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("exchange request timed out: {0}")]
    ExchangeTimeout(String),

    #[error("exchange rejected request (HTTP {status}): {message}")]
    ExchangeRejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid exchange response: {0}")]
    InvalidResponse(String),

    #[error("exchange returned {available} of {requested} requested candles for {symbol}")]
    InsufficientHistory {
        symbol: String,
        requested: usize,
        available: usize,
    },

    #[error("dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("invalid dataset {}: {message}", .path.display())]
    InvalidDataset { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MarketError {
    /// Whether the error came from the exchange rather than local input or storage
    pub fn is_exchange_error(&self) -> bool {
        matches!(
            self,
            Self::ExchangeTimeout(_)
                | Self::ExchangeRejected { .. }
                | Self::Network(_)
                | Self::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ExchangeTimeout(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::ExchangeRejected {
                status: status.as_u16(),
                code: None,
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_classification() {
        assert!(MarketError::ExchangeTimeout("slow".into()).is_exchange_error());
        assert!(MarketError::ExchangeRejected {
            status: 400,
            code: Some(-1121),
            message: "Invalid symbol.".into(),
        }
        .is_exchange_error());
        assert!(!MarketError::SymbolNotFound("FOOBAR".into()).is_exchange_error());
        assert!(!MarketError::DatasetNotFound(PathBuf::from("data/x.csv")).is_exchange_error());
    }

    #[test]
    fn test_display_messages() {
        let err = MarketError::EmptyOrderBook {
            symbol: "BTCUSDT".into(),
            side: "bids",
        };
        assert_eq!(err.to_string(), "order book for BTCUSDT has no bids");

        let err = MarketError::FilterNotFound {
            symbol: "BTCUSDT".into(),
            filter: "LOT_SIZE",
        };
        assert_eq!(err.to_string(), "LOT_SIZE not found for BTCUSDT");
    }
}
