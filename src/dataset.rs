//! Dataset orchestration: download-and-store or reuse what is stored
//!
//! The table handed back always comes from the stored file, so a download
//! that failed to persist shows up as `DatasetNotFound` rather than as an
//! in-memory result nobody can reload.

use tracing::info;

use crate::error::Result;
use crate::exchange::ExchangeClient;
use crate::fetcher::KlineFetcher;
use crate::progress::ProgressSink;
use crate::store::CsvStore;
use crate::symbol::{Symbol, SymbolSpec};
use crate::table::{CandleTable, TimestampFormat};

/// What to obtain and whether to download it first
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub symbol: SymbolSpec,
    pub interval: String,
    /// Newest open time to include, epoch ms
    pub end_time: i64,
    pub count: usize,
    /// When false, only the stored dataset is loaded
    pub download: bool,
}

/// Download (when requested), persist, then load the dataset back
pub fn obtain<C, P>(
    fetcher: &KlineFetcher<C>,
    store: &CsvStore,
    request: &DatasetRequest,
    progress: &mut P,
) -> Result<CandleTable>
where
    C: ExchangeClient,
    P: ProgressSink + ?Sized,
{
    let name = if request.download {
        let symbol = Symbol::resolve(fetcher.client(), request.symbol.clone())?;
        let candles = fetcher.fetch(
            symbol.name(),
            &request.interval,
            request.end_time,
            request.count,
            progress,
        )?;
        let table = CandleTable::from_candles(&candles, TimestampFormat::EpochMillis);
        store.save(symbol.name(), &request.interval, &table)?;
        symbol.name().to_string()
    } else {
        info!(
            "Reusing stored {} {} dataset",
            request.symbol.name(),
            request.interval
        );
        request.symbol.name()
    };

    store.load(&name, &request.interval)
}
