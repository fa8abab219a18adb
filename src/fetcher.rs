//! Paginated kline download
//!
//! The klines endpoint caps every response (1000 rows on Binance) and answers
//! "the `limit` candles whose open time is at or before `endTime`". A large
//! download therefore walks backward: each page ends at the oldest open time
//! of the page before it, which means every page after the first repeats
//! that boundary candle as its newest row. [`stitch`] drops the repeat.
//!
//! The whole download either succeeds with exactly the requested number of
//! candles or fails; partially accumulated pages are never returned.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::binance::MAX_KLINES_PER_REQUEST;
use crate::error::{MarketError, Result};
use crate::exchange::ExchangeClient;
use crate::pacer::RequestPacer;
use crate::progress::{NoProgress, ProgressSink};
use crate::table::{CandleTable, TimestampFormat};
use crate::types::{validate_interval, Candle};

/// Smallest usable page: later pages repeat the boundary candle, so a
/// single-row page could never reach older history
pub const MIN_PAGE_SIZE: usize = 2;

/// Pagination settings
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Exchange cap on rows per request, clamped to `MIN_PAGE_SIZE..=1000`
    pub max_page_size: usize,
    /// Pause before every request, the first one included
    pub request_delay: Duration,
    /// When false, the request that completes the download is not delayed
    pub delay_final_page: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            max_page_size: MAX_KLINES_PER_REQUEST,
            request_delay: Duration::from_secs(1),
            delay_final_page: true,
        }
    }
}

impl FetchConfig {
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn with_delay_final_page(mut self, delay: bool) -> Self {
        self.delay_final_page = delay;
        self
    }
}

/// Prepend an older batch to a newer sequence
///
/// Both inputs are ordered by open time. Candles of `older` that open at or
/// after the first candle of `newer` are already present and are dropped;
/// with back-to-back pages that is exactly the shared boundary candle.
pub fn stitch(mut older: Vec<Candle>, newer: Vec<Candle>) -> Vec<Candle> {
    if let Some(first) = newer.first() {
        let keep = older.partition_point(|c| c.open_time < first.open_time);
        older.truncate(keep);
    }
    older.extend(newer);
    older
}

/// Downloads candle history page by page
#[derive(Debug)]
pub struct KlineFetcher<C> {
    client: C,
    config: FetchConfig,
    pacer: RequestPacer,
}

impl<C: ExchangeClient> KlineFetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        let pacer = RequestPacer::new(config.request_delay);
        KlineFetcher {
            client,
            config,
            pacer,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// Fetch exactly `target` candles ending at `end_time` (epoch ms), oldest first
    pub fn fetch<P: ProgressSink + ?Sized>(
        &self,
        symbol: &str,
        interval: &str,
        end_time: i64,
        target: usize,
        progress: &mut P,
    ) -> Result<Vec<Candle>> {
        validate_interval(interval)?;
        if target == 0 {
            return Err(MarketError::InvalidArguments(
                "candle count must be positive".to_string(),
            ));
        }

        let max_page = self
            .config
            .max_page_size
            .clamp(MIN_PAGE_SIZE, MAX_KLINES_PER_REQUEST);
        let mut remaining = target;
        let mut boundary = end_time;
        let mut candles: Vec<Candle> = Vec::with_capacity(target);
        let mut page = 0usize;

        info!(
            "Fetching {} {} {} candles ending at {}",
            target, symbol, interval, end_time
        );

        while remaining > 0 {
            // Later pages carry the boundary candle again, so ask for one more.
            let wanted = if page == 0 { remaining } else { remaining + 1 };
            let limit = wanted.min(max_page);
            let last_request = limit == wanted;

            if self.config.delay_final_page || !last_request {
                self.pacer.pause();
            }
            page += 1;

            debug!(
                "Page {}: requesting {} candles ending at {}",
                page, limit, boundary
            );

            let batch = self
                .client
                .get_klines(symbol, interval, limit, Some(boundary))
                .map_err(|e| {
                    warn!(
                        "Page {} of {} {} failed after {} candles: {}",
                        page,
                        symbol,
                        interval,
                        candles.len(),
                        e
                    );
                    e
                })?;

            let Some(oldest) = batch.first().map(|c| c.open_time) else {
                return Err(self.insufficient(symbol, target, candles.len()));
            };

            let before = candles.len();
            candles = if page == 1 {
                batch
            } else {
                stitch(batch, candles)
            };

            let mut added = candles.len() - before;
            if added > remaining {
                candles.drain(..added - remaining);
                added = remaining;
            }
            if added == 0 {
                return Err(self.insufficient(symbol, target, candles.len()));
            }

            remaining -= added;
            boundary = oldest;

            progress.report(candles.len() as f64 / target as f64 * 100.0);
        }

        progress.report(100.0);
        info!(
            "Fetched {} candles for {} {} in {} requests",
            candles.len(),
            symbol,
            interval,
            page
        );

        Ok(candles)
    }

    /// Most recent `limit` candles with date-time stamps
    ///
    /// Fits in one request up to the page cap; larger counts go through
    /// [`KlineFetcher::fetch`] and its pacing.
    pub fn recent(&self, symbol: &str, interval: &str, limit: usize) -> Result<CandleTable> {
        validate_interval(interval)?;
        if limit == 0 {
            return Err(MarketError::InvalidArguments(
                "candle count must be positive".to_string(),
            ));
        }

        let candles = if limit <= self.config.max_page_size.min(MAX_KLINES_PER_REQUEST) {
            self.client.get_klines(symbol, interval, limit, None)?
        } else {
            let now = Utc::now().timestamp_millis();
            self.fetch(symbol, interval, now, limit, &mut NoProgress)?
        };

        Ok(CandleTable::from_candles(&candles, TimestampFormat::DateTime))
    }

    fn insufficient(&self, symbol: &str, requested: usize, available: usize) -> MarketError {
        warn!(
            "Exchange has no older candles for {}: {} of {} fetched",
            symbol, available, requested
        );
        MarketError::InsufficientHistory {
            symbol: symbol.to_string(),
            requested,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::types::{AveragePrice, OrderBook, SymbolInfo};

    const MINUTE: i64 = 60_000;

    fn candle(open_time: i64) -> Candle {
        Candle {
            open_time,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
            close_time: open_time + MINUTE - 1,
            quote_volume: 0.0,
            trades: 0,
            taker_buy_base: 0.0,
            taker_buy_quote: 0.0,
            ignore: "0".to_string(),
        }
    }

    fn run(from: i64, to: i64) -> Vec<Candle> {
        (from..=to).map(|i| candle(i * MINUTE)).collect()
    }

    /// One-minute series with `len` candles, newest opening at `(len - 1) * MINUTE`
    struct Series {
        len: i64,
        requests: RefCell<Vec<(usize, Option<i64>)>>,
    }

    impl Series {
        fn new(len: i64) -> Self {
            Series {
                len,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ExchangeClient for Series {
        fn get_symbol_info(&self, _symbol: &str) -> Result<Option<SymbolInfo>> {
            Ok(None)
        }

        fn get_order_book(&self, _symbol: &str) -> Result<OrderBook> {
            Ok(OrderBook::default())
        }

        fn get_average_price(&self, symbol: &str) -> Result<AveragePrice> {
            Err(MarketError::SymbolNotFound(symbol.to_string()))
        }

        fn get_klines(
            &self,
            _symbol: &str,
            _interval: &str,
            limit: usize,
            end_time: Option<i64>,
        ) -> Result<Vec<Candle>> {
            self.requests.borrow_mut().push((limit, end_time));
            let newest = end_time.map_or(self.len - 1, |end| (end / MINUTE).min(self.len - 1));
            let oldest = (newest - limit as i64 + 1).max(0);
            Ok(run(oldest, newest))
        }
    }

    fn fetcher(series: Series, page: usize) -> KlineFetcher<Series> {
        KlineFetcher::new(
            series,
            FetchConfig::default()
                .with_request_delay(Duration::ZERO)
                .with_max_page_size(page),
        )
    }

    #[test]
    fn test_stitch_drops_boundary_candle() {
        let merged = stitch(run(0, 4), run(4, 9));
        assert_eq!(merged.len(), 10);
        assert_eq!(merged.first().unwrap().open_time, 0);
        assert_eq!(merged.last().unwrap().open_time, 9 * MINUTE);
        assert!(merged.windows(2).all(|w| w[0].open_time < w[1].open_time));
    }

    #[test]
    fn test_stitch_without_overlap_keeps_everything() {
        let merged = stitch(run(0, 3), run(4, 6));
        assert_eq!(merged.len(), 7);
    }

    #[test]
    fn test_stitch_with_empty_sides() {
        assert_eq!(stitch(Vec::new(), run(0, 2)).len(), 3);
        assert_eq!(stitch(run(0, 2), Vec::new()).len(), 3);
    }

    #[test]
    fn test_fetch_walks_backward_from_boundary() {
        let f = fetcher(Series::new(100), 10);
        let end = 99 * MINUTE;
        let candles = f.fetch("BTCUSDT", "1m", end, 25, &mut NoProgress).unwrap();

        assert_eq!(candles.len(), 25);
        assert_eq!(candles.first().unwrap().open_time, 75 * MINUTE);
        assert_eq!(candles.last().unwrap().open_time, end);

        let requests = f.client().requests.borrow().clone();
        assert_eq!(
            requests,
            vec![
                (10, Some(99 * MINUTE)),
                (10, Some(90 * MINUTE)),
                (7, Some(81 * MINUTE)),
            ]
        );
        assert_eq!(f.pacer().pauses(), 3);
    }

    #[test]
    fn test_single_row_pages_are_widened() {
        let f = fetcher(Series::new(100), 1);
        let candles = f.fetch("BTCUSDT", "1m", 99 * MINUTE, 5, &mut NoProgress).unwrap();

        assert_eq!(candles.len(), 5);
        assert_eq!(candles.first().unwrap().open_time, 95 * MINUTE);
        let requests = f.client().requests.borrow().clone();
        assert!(requests.iter().all(|(limit, _)| *limit == MIN_PAGE_SIZE));
        // 2 new candles on the first page, then 1 per overlapping page
        assert_eq!(requests.len(), 4);
    }

    #[test]
    fn test_exact_multiple_of_page_takes_one_more_request() {
        let f = fetcher(Series::new(100), 10);
        let candles = f.fetch("BTCUSDT", "1m", 99 * MINUTE, 20, &mut NoProgress).unwrap();

        assert_eq!(candles.len(), 20);
        // second page only adds 9 new candles, the last one needs a third request
        assert_eq!(
            f.client().requests.borrow().clone(),
            vec![
                (10, Some(99 * MINUTE)),
                (10, Some(90 * MINUTE)),
                (2, Some(81 * MINUTE)),
            ]
        );
    }

    #[test]
    fn test_fetch_reports_progress() {
        let f = fetcher(Series::new(100), 10);
        let mut reports = Vec::new();
        let mut sink = |p: f64| reports.push(p);
        f.fetch("BTCUSDT", "1m", 99 * MINUTE, 20, &mut sink).unwrap();

        assert_eq!(reports.len(), 4);
        assert!((reports[0] - 50.0).abs() < 1e-9);
        assert!((reports[1] - 95.0).abs() < 1e-9);
        assert_eq!(reports[2], 100.0);
        assert_eq!(reports[3], 100.0);
    }

    #[test]
    fn test_final_page_delay_can_be_skipped() {
        let f = KlineFetcher::new(
            Series::new(100),
            FetchConfig::default()
                .with_request_delay(Duration::ZERO)
                .with_max_page_size(10)
                .with_delay_final_page(false),
        );
        f.fetch("BTCUSDT", "1m", 99 * MINUTE, 25, &mut NoProgress)
            .unwrap();
        assert_eq!(f.client().requests.borrow().len(), 3);
        assert_eq!(f.pacer().pauses(), 2);
    }

    #[test]
    fn test_short_history_is_an_error() {
        let f = fetcher(Series::new(15), 10);
        let err = f
            .fetch("BTCUSDT", "1m", 14 * MINUTE, 30, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientHistory {
                requested: 30,
                available: 15,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        let f = fetcher(Series::new(10), 10);
        assert!(matches!(
            f.fetch("BTCUSDT", "1m", 0, 0, &mut NoProgress),
            Err(MarketError::InvalidArguments(_))
        ));
        assert!(matches!(
            f.fetch("BTCUSDT", "2m", 0, 5, &mut NoProgress),
            Err(MarketError::InvalidInterval(_))
        ));
        assert!(f.client().requests.borrow().is_empty());
    }

    #[test]
    fn test_recent_uses_date_times() {
        let f = fetcher(Series::new(50), 1000);
        let table = f.recent("BTCUSDT", "1m", 5).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.timestamp_format(), TimestampFormat::DateTime);
        assert_eq!(f.client().requests.borrow()[0], (5, None));
        assert_eq!(f.pacer().pauses(), 0);
    }
}
