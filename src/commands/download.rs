//! Download command - fetch a candle history and store it as CSV

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::info;

use symbol_klines::progress::percent_bar;
use symbol_klines::{
    dataset, BinanceClient, Config, CsvStore, DatasetRequest, KlineFetcher, SymbolSpec,
};

use super::parse_end_time;

#[allow(clippy::too_many_arguments)]
pub fn run(
    mut config: Config,
    symbol: SymbolSpec,
    interval: String,
    count: usize,
    end: Option<String>,
    output: Option<PathBuf>,
    delay: Option<f64>,
    reuse: bool,
) -> Result<()> {
    if let Some(dir) = output {
        config.download.data_dir = dir;
    }
    if let Some(secs) = delay {
        config.download.request_delay_secs = secs;
    }
    config.validate()?;

    let end_time = parse_end_time(end.as_deref())?;
    let name = symbol.name();

    info!(
        "Starting {} of {} {} ({} candles, end={}, delay={}s, dir={})",
        if reuse { "reload" } else { "download" },
        name,
        interval,
        count,
        end_time,
        config.download.request_delay_secs,
        config.download.data_dir.display()
    );

    let client = BinanceClient::with_config(&config.exchange)?;
    let fetcher = KlineFetcher::new(client, config.download.fetch_config());
    let store = CsvStore::new(&config.download.data_dir);

    let request = DatasetRequest {
        symbol,
        interval: interval.clone(),
        end_time,
        count,
        download: !reuse,
    };

    let mut pb = if reuse {
        ProgressBar::hidden()
    } else {
        percent_bar(&format!("{} {}", name, interval))
    };

    let table = dataset::obtain(&fetcher, &store, &request, &mut pb)
        .with_context(|| format!("Failed to obtain {} {} dataset", name, interval))?;
    pb.finish_and_clear();

    println!("\n{}", "=".repeat(60));
    println!("{} {} DATASET", name, interval);
    println!("{}", "=".repeat(60));
    println!("  Rows:     {}", table.len());
    if let Some((first, last)) = table.time_range() {
        println!("  First:    {}", format_ms(first));
        println!("  Last:     {}", format_ms(last));
    }
    println!("  File:     {}", store.path_for(&name, &interval).display());
    println!("{}", "=".repeat(60));

    Ok(())
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
