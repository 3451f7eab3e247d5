//! `chip`: chip distribution for daily bar CSV files.
//!
//! Subcommands:
//!   - `calc`: one symbol from a data directory
//!   - `batch`: many symbols; failures become empty entries
//!   - `file`: one CSV file, no directory lookup

mod fetcher;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chip_core::kline::bar_adapter::BarAdapter;
use chip_core::{ChipCalculator, ChipConfig, ChipError};
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::fetcher::{read_csv_file, CsvDirFetcher};
use crate::output::{render_batch, render_result, OutputFormat};

#[derive(Parser)]
#[command(
    name = "chip",
    version,
    about = "Estimate holder cost distribution from daily bars",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate one symbol from a data directory
    Calc(CalcArgs),
    /// Calculate several symbols from a data directory
    Batch(BatchArgs),
    /// Calculate directly from one CSV file
    File(FileArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// JSON config file; command line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Most recent bars used for the calculation
    #[arg(long)]
    calc_days: Option<usize>,

    /// Bars requested from the data directory
    #[arg(long)]
    fetch_days: Option<usize>,

    /// Price levels in the grid
    #[arg(long)]
    bins: Option<usize>,

    /// Bars up to the target feeding the price grid (default: all)
    #[arg(long)]
    range: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args)]
struct CalcArgs {
    /// Directory holding <code>.csv files
    #[arg(long)]
    data_dir: PathBuf,

    code: String,

    /// Include the per-level distribution
    #[arg(long)]
    distribution: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long)]
    data_dir: PathBuf,

    #[arg(required = true)]
    codes: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct FileArgs {
    path: PathBuf,

    /// Code reported in the result (default: file stem)
    #[arg(long)]
    code: Option<String>,

    #[arg(long)]
    distribution: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, ChipError> {
    match cli.command {
        Commands::Calc(args) => {
            let config = load_config(&args.common)?;
            let fetcher = CsvDirFetcher::new(&args.data_dir, config.autofix);
            let calc = ChipCalculator::new(config, Arc::new(fetcher))?;
            let bars = calc.fetch(&args.code)?;
            let result = calc.calculate(&args.code, &bars)?;
            let snapshot = if args.distribution {
                Some(calc.snapshot(&bars)?)
            } else {
                None
            };
            Ok(render_result(&result, snapshot.as_ref(), args.common.format)?)
        }
        Commands::Batch(args) => {
            let config = load_config(&args.common)?;
            let fetcher = CsvDirFetcher::new(&args.data_dir, config.autofix);
            let calc = ChipCalculator::new(config, Arc::new(fetcher))?;
            let batch = calc.calculate_batch(&args.codes);
            Ok(render_batch(&batch, args.common.format)?)
        }
        Commands::File(args) => {
            let config = load_config(&args.common)?;
            let code = args.code.clone().unwrap_or_else(|| file_stem(&args.path));
            let bars = read_csv_file(&args.path, &BarAdapter::new(config.autofix))?;
            let calc = ChipCalculator::offline(config)?;
            let result = calc.calculate(&code, &bars)?;
            let snapshot = if args.distribution {
                Some(calc.snapshot(&bars)?)
            } else {
                None
            };
            Ok(render_result(&result, snapshot.as_ref(), args.common.format)?)
        }
    }
}

fn load_config(args: &CommonArgs) -> Result<ChipConfig, ChipError> {
    let mut config = match &args.config {
        Some(path) => ChipConfig::from_json_file(path)?,
        None => ChipConfig::default(),
    };
    if let Some(calc_days) = args.calc_days {
        config.calc_days = calc_days;
        config.fetch_days = config.fetch_days.max(calc_days);
    }
    if let Some(fetch_days) = args.fetch_days {
        config.fetch_days = fetch_days;
    }
    if let Some(bins) = args.bins {
        config.bin_count = bins;
    }
    if let Some(range) = args.range {
        config.range = Some(range).filter(|r| *r > 0);
    }
    config.validate()?;
    Ok(config)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
