//! symbol-klines - main entry point
//!
//! Subcommands:
//! - download: Download (or reload) a candle dataset to CSV
//! - book: Show the best bid/ask of a symbol
//! - price: Show the average price of a symbol
//! - format: Snap a price or quantity to the symbol's filters
//! - recent: Print the latest candles

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use symbol_klines::Config;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "symbol-klines")]
#[command(about = "Binance symbol lookup, filter formatting and bulk kline downloads", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// A symbol name, or a base and quote currency
#[derive(Args, Debug, Clone)]
struct SymbolArgs {
    /// Trading pair, e.g. "BTCUSDT"
    symbol: Option<String>,

    /// Base currency, e.g. "BTC" (requires --quote)
    #[arg(long)]
    base: Option<String>,

    /// Quote currency, e.g. "USDT" (requires --base)
    #[arg(long)]
    quote: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download historical candles and store them as CSV
    Download {
        #[command(flatten)]
        symbol: SymbolArgs,

        /// Kline interval. E.g., "1m", "1h", "1d"
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Number of candles to fetch
        #[arg(short = 'n', long, default_value = "1000")]
        count: usize,

        /// Newest candle to include: epoch ms or "YYYY-MM-DD[ HH:MM:SS]" (default: now)
        #[arg(short, long)]
        end: Option<String>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds to wait before each request (overrides config)
        #[arg(long)]
        delay: Option<f64>,

        /// Load the stored dataset instead of downloading
        #[arg(long)]
        reuse: bool,
    },

    /// Show the best bid and ask
    Book {
        #[command(flatten)]
        symbol: SymbolArgs,
    },

    /// Show the current average price
    Price {
        #[command(flatten)]
        symbol: SymbolArgs,
    },

    /// Snap a price and/or quantity to the symbol's filters
    Format {
        #[command(flatten)]
        symbol: SymbolArgs,

        /// Raw price
        #[arg(long)]
        price: Option<Decimal>,

        /// Raw quantity
        #[arg(long)]
        qty: Option<Decimal>,
    },

    /// Print the most recent candles
    Recent {
        #[command(flatten)]
        symbol: SymbolArgs,

        /// Kline interval
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Number of candles
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Keep the console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();
    }

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Download { .. } => ("download", true),
        Commands::Book { .. } => ("book", false),
        Commands::Price { .. } => ("price", false),
        Commands::Format { .. } => ("format", false),
        Commands::Recent { .. } => ("recent", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            symbol,
            interval,
            count,
            end,
            output,
            delay,
            reuse,
        } => commands::download::run(
            config,
            symbol.into_spec()?,
            interval,
            count,
            end,
            output,
            delay,
            reuse,
        ),

        Commands::Book { symbol } => commands::market::book(config, symbol.into_spec()?),

        Commands::Price { symbol } => commands::market::price(config, symbol.into_spec()?),

        Commands::Format { symbol, price, qty } => {
            commands::market::format(config, symbol.into_spec()?, price, qty)
        }

        Commands::Recent {
            symbol,
            interval,
            count,
        } => commands::market::recent(config, symbol.into_spec()?, interval, count),
    }
}

impl SymbolArgs {
    fn into_spec(self) -> Result<symbol_klines::SymbolSpec> {
        Ok(symbol_klines::SymbolSpec::from_args(
            self.symbol.as_deref(),
            self.base.as_deref(),
            self.quote.as_deref(),
        )?)
    }
}
