//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_report::SvgReportAdapter;
use crate::domain::analysis::{AnalysisConfig, AnalysisReport, run_analysis};
use crate::domain::config_validation::{
    DATA, build_analysis_config, data_dir, validate_analysis_config, validate_window,
};
use crate::domain::error::BasketError;
use crate::domain::universe::{parse_tickers, preset_names, resolve_preset};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "report";

#[derive(Parser, Debug)]
#[command(name = "basketrisk", about = "Risk indicators for equal-weight ticker baskets")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). Overrides RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full analysis and write charts and CSV files
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma or space separated tickers, replacing the config list
        #[arg(long)]
        tickers: Option<String>,
        /// Named ticker list from the [presets] section
        #[arg(long, conflicts_with = "tickers")]
        preset: Option<String>,
        #[arg(short, long)]
        window: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List tickers with a price file in a data directory
    ListTickers {
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Validate an analysis configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range of ticker(s)
    Info {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        tickers: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Analyze {
            config,
            output,
            tickers,
            preset,
            window,
            dry_run,
        } => run_analyze(
            &config,
            output.as_deref(),
            tickers.as_deref(),
            preset.as_deref(),
            window,
            dry_run,
        ),
        Command::ListTickers { data_dir } => run_list_tickers(&data_dir),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data_dir, tickers } => run_info(&data_dir, &tickers),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` applies unless `-v` is given.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    // A subscriber may already be installed, e.g. when run from tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BasketError> {
    FileConfigAdapter::from_file(path)
}

/// Ticker list from `--tickers` or `--preset`, if either was given.
pub fn resolve_tickers(
    tickers: Option<&str>,
    preset: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Option<Vec<String>>, BasketError> {
    if let Some(list) = tickers {
        return Ok(Some(parse_tickers(list)?));
    }
    if let Some(name) = preset {
        return Ok(Some(resolve_preset(config, name)?));
    }
    Ok(None)
}

/// Builds the analysis config from the file with command-line overrides applied.
pub fn build_config(
    config: &dyn ConfigPort,
    tickers: Option<&str>,
    preset: Option<&str>,
    window: Option<usize>,
) -> Result<AnalysisConfig, BasketError> {
    let tickers = resolve_tickers(tickers, preset, config)?;
    let mut analysis = build_analysis_config(config, tickers)?;
    if let Some(w) = window {
        analysis.window = validate_window(w as i64)?;
    }
    Ok(analysis)
}

pub fn output_dir(output: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

fn run_analyze(
    config_path: &Path,
    output: Option<&Path>,
    tickers: Option<&str>,
    preset: Option<&str>,
    window: Option<usize>,
    dry_run: bool,
) -> Result<(), BasketError> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let analysis = build_config(&adapter, tickers, preset, window)?;
    let dir = data_dir(&adapter)?;

    if dry_run {
        print_config(&analysis);
        eprintln!("\nDry run complete: configuration is valid");
        return Ok(());
    }

    // Stage 2: Run the analysis
    let data_port = CsvPriceAdapter::new(dir).adjusted(adapter.get_bool(DATA, "adjusted", false));
    let report = analyze(&data_port, &analysis)?;

    // Stage 3: Write reports
    let out = output_dir(output, &adapter);
    let written = write_reports(&report, &out)?;
    eprintln!("\n{} files written to: {}", written.len(), out.display());
    Ok(())
}

/// Runs the analysis and prints the console summary.
pub fn analyze(
    data_port: &dyn PriceDataPort,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, BasketError> {
    eprintln!(
        "Analyzing {} tickers, {} to {}",
        config.tickers.len(),
        config.start_date,
        config.end_date
    );
    let report = run_analysis(data_port, config)?;
    print_summary(&report);
    Ok(report)
}

/// Writes the SVG charts and CSV files into `output_dir`.
pub fn write_reports(report: &AnalysisReport, output_dir: &Path) -> Result<Vec<PathBuf>, BasketError> {
    let mut written = SvgReportAdapter::new().write(report, output_dir)?;
    written.extend(CsvReportAdapter::new().write(report, output_dir)?);
    Ok(written)
}

fn print_config(config: &AnalysisConfig) {
    eprintln!("\nAnalysis:");
    eprintln!("  tickers:          {}", config.tickers.join(", "));
    eprintln!(
        "  benchmark:        {}",
        config.benchmark.as_deref().unwrap_or("(none)")
    );
    eprintln!("  period:           {} to {}", config.start_date, config.end_date);
    eprintln!("  window:           {}", config.window);
    eprintln!("  periods per year: {}", config.periods_per_year);
    eprintln!("  risk-free rate:   {:.2}%", config.risk_free_rate * 100.0);
    eprintln!("  return mode:      {}", config.return_mode);
    eprintln!("  missing data:     {}", config.missing_policy);
    eprintln!("  index method:     {}", config.index_method);
    eprintln!("  index base:       {}", config.index_base);
}

fn print_summary(report: &AnalysisReport) {
    let window = report.config.window;

    eprintln!("\n=== Performance ===");
    for row in &report.performance {
        eprintln!("  {:<20} {:>8.2}%", row.name, row.total_return * 100.0);
    }

    eprintln!("\n=== Latest rolling statistics ({window} periods) ===");
    // volatility and sharpe hold the same names in the same order
    for (vol_series, sharpe_series) in report.volatility.iter().zip(&report.sharpe) {
        let vol = vol_series
            .latest()
            .and_then(|p| p.value)
            .map(|v| format!("{:.1}%", v * 100.0))
            .unwrap_or_else(|| "n/a".into());
        let sharpe = sharpe_series
            .latest()
            .and_then(|p| p.value)
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "n/a".into());
        eprintln!("  {:<20} vol {:>8}  sharpe {:>6}", vol_series.name, vol, sharpe);
    }
    if let Some(corr) = report.average_correlation.as_ref().and_then(|c| c.latest()) {
        eprintln!(
            "  average correlation: {:.2} on {}",
            corr.value.unwrap_or_default(),
            corr.date
        );
    }

    let mdd = &report.index_drawdown.max;
    eprintln!("\n=== Index drawdown ===");
    eprintln!("  Max Drawdown:  {:.1}%", mdd.depth * 100.0);
    eprintln!("  Peak:          {}", mdd.peak_date);
    eprintln!("  Trough:        {}", mdd.trough_date);
    match mdd.recovery_date {
        Some(d) => eprintln!("  Recovered:     {} ({} periods)", d, mdd.duration),
        None => eprintln!("  Recovered:     not yet ({} periods underwater)", mdd.duration),
    }
}

fn run_list_tickers(data_dir: &Path) -> Result<(), BasketError> {
    let adapter = CsvPriceAdapter::new(data_dir.to_path_buf());
    let tickers = adapter.list_tickers()?;
    if tickers.is_empty() {
        eprintln!("No price files found in {}", data_dir.display());
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BasketError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_analysis_config(&adapter)?;

    let analysis = build_analysis_config(&adapter, None)?;
    print_config(&analysis);

    let presets = preset_names(&adapter);
    if !presets.is_empty() {
        eprintln!("\nPresets:");
        for name in &presets {
            let tickers = resolve_preset(&adapter, name)?;
            eprintln!("  {}: {}", name, tickers.join(", "));
        }
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(data_dir: &Path, tickers: &str) -> Result<(), BasketError> {
    let tickers = parse_tickers(tickers)?;
    let adapter = CsvPriceAdapter::new(data_dir.to_path_buf());

    for ticker in &tickers {
        match adapter.data_range(ticker) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} prices, {} to {}", ticker, count, first, last);
            }
            Ok(None) => eprintln!("{}: no data found", ticker),
            Err(e) => eprintln!("error querying {}: {}", ticker, e),
        }
    }
    Ok(())
}
