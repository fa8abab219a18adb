//! Symbol resolution
//!
//! A [`Symbol`] is built from either a pair name (`BTCUSDT`) or a base and
//! quote currency (`BTC` + `USDT`). Resolution fetches the symbol metadata
//! once and checks that the order book has resting orders on both sides,
//! which is how unlisted or halted symbols are rejected.

use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, info};

use crate::error::{MarketError, Result};
use crate::exchange::ExchangeClient;
use crate::types::{AveragePrice, OrderBook, SymbolInfo};

/// The two ways a caller can name a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolSpec {
    Name(String),
    Pair { base: String, quote: String },
}

impl SymbolSpec {
    pub fn from_symbol(name: &str) -> Self {
        SymbolSpec::Name(normalize(name))
    }

    pub fn from_currency_pair(base: &str, quote: &str) -> Self {
        SymbolSpec::Pair {
            base: normalize(base),
            quote: normalize(quote),
        }
    }

    /// Build from optional inputs: either a symbol alone or base and quote together
    pub fn from_args(
        symbol: Option<&str>,
        base: Option<&str>,
        quote: Option<&str>,
    ) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        match (present(symbol), present(base), present(quote)) {
            (Some(name), None, None) => Ok(Self::from_symbol(name)),
            (None, Some(base), Some(quote)) => Ok(Self::from_currency_pair(base, quote)),
            (None, None, None) => Err(MarketError::InvalidArguments(
                "either a symbol or a base and quote currency is required".to_string(),
            )),
            (Some(_), _, _) => Err(MarketError::InvalidArguments(
                "give either a symbol or a base and quote currency, not both".to_string(),
            )),
            (None, _, _) => Err(MarketError::InvalidArguments(
                "base and quote currency must be given together".to_string(),
            )),
        }
    }

    /// Exchange symbol name, e.g. `BTCUSDT`
    pub fn name(&self) -> String {
        match self {
            SymbolSpec::Name(name) => name.clone(),
            SymbolSpec::Pair { base, quote } => format!("{}{}", base, quote),
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A resolved trading pair with its exchange metadata and latest order book
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    base: String,
    quote: String,
    info: SymbolInfo,
    order_book: OrderBook,
}

impl Symbol {
    /// Resolve a symbol against the exchange
    ///
    /// Issues one metadata request and one order book request.
    pub fn resolve<C: ExchangeClient>(client: &C, spec: SymbolSpec) -> Result<Self> {
        let name = spec.name();
        if name.is_empty() {
            return Err(MarketError::InvalidArguments(
                "symbol name is empty".to_string(),
            ));
        }

        let info = client
            .get_symbol_info(&name)?
            .ok_or_else(|| MarketError::SymbolNotFound(name.clone()))?;

        let order_book = client.get_order_book(&name)?;
        if let Some(side) = order_book.empty_side() {
            return Err(MarketError::EmptyOrderBook { symbol: name, side });
        }

        let (base, quote) = match spec {
            SymbolSpec::Pair { base, quote } => (base, quote),
            SymbolSpec::Name(_) => (info.base_asset.clone(), info.quote_asset.clone()),
        };

        info!(
            "Resolved {} ({}/{}), status={}, {} bids / {} asks",
            name,
            base,
            quote,
            info.status,
            order_book.bids.len(),
            order_book.asks.len()
        );

        Ok(Symbol {
            name,
            base,
            quote,
            info,
            order_book,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn info(&self) -> &SymbolInfo {
        &self.info
    }

    /// Last fetched order book snapshot
    pub fn order_book(&self) -> &OrderBook {
        &self.order_book
    }

    /// Replace the order book snapshot with a fresh one
    pub fn refresh<C: ExchangeClient>(&mut self, client: &C) -> Result<&OrderBook> {
        debug!("Refreshing order book for {}", self.name);
        self.order_book = client.get_order_book(&self.name)?;
        Ok(&self.order_book)
    }

    /// Best ask after a refresh
    pub fn ask<C: ExchangeClient>(&mut self, client: &C) -> Result<Decimal> {
        self.refresh(client)?;
        self.order_book
            .best_ask()
            .map(|level| level.price)
            .ok_or_else(|| MarketError::EmptyOrderBook {
                symbol: self.name.clone(),
                side: "asks",
            })
    }

    /// Best bid after a refresh
    pub fn bid<C: ExchangeClient>(&mut self, client: &C) -> Result<Decimal> {
        self.refresh(client)?;
        self.order_book
            .best_bid()
            .map(|level| level.price)
            .ok_or_else(|| MarketError::EmptyOrderBook {
                symbol: self.name.clone(),
                side: "bids",
            })
    }

    pub fn average_price<C: ExchangeClient>(&self, client: &C) -> Result<AveragePrice> {
        client.get_average_price(&self.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_constructors_normalize() {
        assert_eq!(SymbolSpec::from_symbol(" btcusdt ").name(), "BTCUSDT");
        assert_eq!(SymbolSpec::from_currency_pair("eth", "Btc").name(), "ETHBTC");
    }

    #[test]
    fn test_from_args_shapes() {
        assert_eq!(
            SymbolSpec::from_args(Some("bnbusdt"), None, None).unwrap(),
            SymbolSpec::Name("BNBUSDT".to_string())
        );
        assert_eq!(
            SymbolSpec::from_args(None, Some("bnb"), Some("usdt")).unwrap(),
            SymbolSpec::Pair {
                base: "BNB".to_string(),
                quote: "USDT".to_string()
            }
        );
        assert_eq!(
            SymbolSpec::from_args(Some("  ethbtc "), Some(" "), Some("")).unwrap(),
            SymbolSpec::Name("ETHBTC".to_string())
        );
        assert!(SymbolSpec::from_args(Some("   "), None, None).is_err());
    }

    #[test]
    fn test_from_args_rejects_invalid_shapes() {
        let cases = [
            (None, None, None),
            (Some("BTCUSDT"), Some("BTC"), Some("USDT")),
            (Some("BTCUSDT"), Some("BTC"), None),
            (None, Some("BTC"), None),
            (None, None, Some("USDT")),
            (Some("  "), None, None),
        ];

        for (symbol, base, quote) in cases {
            assert!(
                matches!(
                    SymbolSpec::from_args(symbol, base, quote),
                    Err(MarketError::InvalidArguments(_))
                ),
                "expected InvalidArguments for {:?}",
                (symbol, base, quote)
            );
        }
    }
}
