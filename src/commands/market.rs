//! Single-call market data commands: order book, average price, formatting
//! and recent candles

use anyhow::Result;
use rust_decimal::Decimal;

use symbol_klines::{BinanceClient, Config, KlineFetcher, Symbol, SymbolSpec};

pub fn book(config: Config, spec: SymbolSpec) -> Result<()> {
    let client = BinanceClient::with_config(&config.exchange)?;
    let symbol = Symbol::resolve(&client, spec)?;
    let book = symbol.order_book();

    println!("{} ({}/{})", symbol, symbol.base(), symbol.quote());
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        println!("  Bid:    {} x {}", bid.price, bid.quantity);
        println!("  Ask:    {} x {}", ask.price, ask.quantity);
    }
    if let Some(spread) = book.spread() {
        println!("  Spread: {}", spread);
    }
    println!("  Depth:  {} bids / {} asks", book.bids.len(), book.asks.len());

    Ok(())
}

pub fn price(config: Config, spec: SymbolSpec) -> Result<()> {
    let client = BinanceClient::with_config(&config.exchange)?;
    let symbol = Symbol::resolve(&client, spec)?;
    let avg = symbol.average_price(&client)?;

    println!("{} average price ({}m): {}", symbol, avg.mins, avg.price);
    Ok(())
}

pub fn format(
    config: Config,
    spec: SymbolSpec,
    price: Option<Decimal>,
    qty: Option<Decimal>,
) -> Result<()> {
    if price.is_none() && qty.is_none() {
        anyhow::bail!("Nothing to format: pass --price and/or --qty");
    }

    let client = BinanceClient::with_config(&config.exchange)?;
    let symbol = Symbol::resolve(&client, spec)?;

    if let Some(raw) = price {
        println!(
            "Price:    {} -> {} (tick {}, {} digits)",
            raw,
            symbol.format_price(raw)?,
            symbol.point()?,
            symbol.digits()?
        );
    }
    if let Some(raw) = qty {
        println!(
            "Quantity: {} -> {} ({} digits)",
            raw,
            symbol.format_quantity(raw)?,
            symbol.lot_digits()?
        );
    }

    Ok(())
}

pub fn recent(config: Config, spec: SymbolSpec, interval: String, count: usize) -> Result<()> {
    let client = BinanceClient::with_config(&config.exchange)?;
    let symbol = Symbol::resolve(&client, spec)?;
    let fetcher = KlineFetcher::new(&client, config.download.fetch_config());
    let table = fetcher.recent(symbol.name(), &interval, count)?;

    println!(
        "{:<24} {:>14} {:>14} {:>14} {:>14} {:>16}",
        "Open time", "Open", "High", "Low", "Close", "Volume"
    );
    for row in table.rows() {
        println!(
            "{:<24} {:>14} {:>14} {:>14} {:>14} {:>16}",
            row.open_time.to_string(),
            row.open,
            row.high,
            row.low,
            row.close,
            row.volume
        );
    }

    Ok(())
}
