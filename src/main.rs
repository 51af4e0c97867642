use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use std::path::PathBuf;

use growth_screener::analyzer::{TickerSeries, screen_parallel};
use growth_screener::config::ScreenerConfig;
use growth_screener::data::{get_bars_from_input_file, ticker_from_path};
use growth_screener::output::{print_json, print_moves, write_sheet_file};
use growth_screener::telemetry::init_logging;

#[derive(Debug, Parser)]
#[command(about = "Screen daily OHLC history for growth and superperformance moves")]
struct Args {
    /// Price files, one per ticker (CSV date,open,high,low,close[,volume] or EODHD JSON).
    /// The ticker is the upper-cased file stem.
    #[arg(long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Screening parameters file (e.g. TOML); SCREENER_* env vars override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write results as a sheet-style CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print JSON instead of the console report
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Keep moves classified as None
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_inputs(paths: &[PathBuf]) -> Vec<TickerSeries> {
    let mut inputs = Vec::with_capacity(paths.len());

    for path in paths {
        let Some(ticker) = ticker_from_path(path) else {
            error!(path = ?path, "cannot derive ticker from file name");
            continue;
        };

        // one unreadable file must not stop the run
        match get_bars_from_input_file(path) {
            Ok(bars) => {
                info!(ticker = %ticker, bars = bars.len(), "loaded series");
                inputs.push(TickerSeries { ticker, bars });
            }
            Err(err) => error!(ticker = %ticker, "failed to load series: {err:#}"),
        }
    }

    inputs
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = ScreenerConfig::load(args.config)?;
    info!(config = %config.describe_config(), "screening parameters");

    let inputs = load_inputs(&args.input);
    if inputs.is_empty() {
        println!("No price data loaded.");
        return Ok(());
    }

    let reports = screen_parallel(config, &inputs, args.all);
    let total: usize = reports.iter().map(|r| r.moves.len()).sum();
    info!(tickers = reports.len(), moves = total, "screening complete");

    if args.json {
        print_json(&reports)?;
    } else {
        print_moves(&reports);
    }

    if let Some(path) = args.output {
        write_sheet_file(&path, &reports)?;
        info!(path = ?path, "results written");
    }

    Ok(())
}
