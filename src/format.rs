//! Price and quantity formatting against exchange filters
//!
//! Values are snapped down onto the filter's grid (`min + n * step`) and then
//! truncated to the number of decimals the step size carries. Snapping never
//! rounds up, so a formatted order never exceeds the caller's raw value.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{MarketError, Result};
use crate::symbol::Symbol;
use crate::types::{SymbolFilter, SymbolInfo};

/// Decimal places implied by a step size written as a decimal string
///
/// Trailing zeros are stripped before counting, so `"0.00010000"` gives 4
/// and `"1.00000000"` gives 0.
pub fn precision_of(step: &str) -> u32 {
    let trimmed = step.trim().trim_end_matches('0');
    match trimmed.find('.') {
        Some(dot) => (trimmed.len() - dot - 1) as u32,
        None => 0,
    }
}

/// [`precision_of`] applied to the decimal's own string form, which keeps
/// the scale the exchange sent
pub fn step_precision(step: &Decimal) -> u32 {
    precision_of(&step.to_string())
}

/// A minimum plus increment pair taken from `PRICE_FILTER` or `LOT_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRule {
    pub min: Decimal,
    pub step: Decimal,
}

impl StepRule {
    pub fn new(min: Decimal, step: Decimal) -> Self {
        StepRule { min, step }
    }

    pub fn precision(&self) -> u32 {
        step_precision(&self.step)
    }

    /// `raw - ((raw - min) mod step)`, then truncated to the step precision
    ///
    /// The modulo is floored, so values below `min` also move down. A zero
    /// step only truncates.
    pub fn apply(&self, raw: Decimal) -> Decimal {
        let snapped = if self.step.is_zero() {
            raw
        } else {
            let mut offset = (raw - self.min) % self.step;
            if offset.is_sign_negative() && !offset.is_zero() {
                offset += self.step;
            }
            raw - offset
        };

        snapped
            .round_dp_with_strategy(self.precision(), RoundingStrategy::ToZero)
            .normalize()
    }
}

impl SymbolInfo {
    /// Grid from the `PRICE_FILTER` entry
    pub fn price_rule(&self) -> Result<StepRule> {
        self.filters
            .iter()
            .find_map(|f| match f {
                SymbolFilter::PriceFilter {
                    min_price,
                    tick_size,
                    ..
                } => Some(StepRule::new(*min_price, *tick_size)),
                _ => None,
            })
            .ok_or_else(|| MarketError::FilterNotFound {
                symbol: self.symbol.clone(),
                filter: "PRICE_FILTER",
            })
    }

    /// Grid from the `LOT_SIZE` entry
    pub fn lot_rule(&self) -> Result<StepRule> {
        self.filters
            .iter()
            .find_map(|f| match f {
                SymbolFilter::LotSize {
                    min_qty, step_size, ..
                } => Some(StepRule::new(*min_qty, *step_size)),
                _ => None,
            })
            .ok_or_else(|| MarketError::FilterNotFound {
                symbol: self.symbol.clone(),
                filter: "LOT_SIZE",
            })
    }

    pub fn format_price(&self, raw: Decimal) -> Result<Decimal> {
        Ok(self.price_rule()?.apply(raw))
    }

    pub fn format_quantity(&self, raw: Decimal) -> Result<Decimal> {
        Ok(self.lot_rule()?.apply(raw))
    }

    /// Value of one price point (the tick size)
    pub fn point(&self) -> Result<Decimal> {
        Ok(self.price_rule()?.step)
    }

    /// Decimal places of a price
    pub fn digits(&self) -> Result<u32> {
        Ok(self.price_rule()?.precision())
    }

    /// Decimal places of a quantity
    pub fn lot_digits(&self) -> Result<u32> {
        Ok(self.lot_rule()?.precision())
    }
}

impl Symbol {
    pub fn format_price(&self, raw: Decimal) -> Result<Decimal> {
        self.info().format_price(raw)
    }

    pub fn format_quantity(&self, raw: Decimal) -> Result<Decimal> {
        self.info().format_quantity(raw)
    }

    pub fn point(&self) -> Result<Decimal> {
        self.info().point()
    }

    pub fn digits(&self) -> Result<u32> {
        self.info().digits()
    }

    pub fn lot_digits(&self) -> Result<u32> {
        self.info().lot_digits()
    }
}
