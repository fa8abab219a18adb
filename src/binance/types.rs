//! Binance response envelopes that do not map onto crate types directly

use serde::Deserialize;

use crate::types::SymbolInfo;

/// Error payload returned with non-2xx responses, e.g.
/// `{"code": -1121, "msg": "Invalid symbol."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Error code for a symbol the exchange does not list
pub const INVALID_SYMBOL: i64 = -1121;

#[derive(Debug, Deserialize)]
pub(crate) struct ExchangeInfoResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}
