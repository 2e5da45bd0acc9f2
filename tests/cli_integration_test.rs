//! CLI integration tests for the analyze command orchestration.
//!
//! Tests cover:
//! - Argument parsing (clap definitions)
//! - Config building with command-line overrides
//! - Ticker resolution from --tickers and --preset
//! - Full runs against CSV price files on disk

mod common;

use basketrisk::adapters::csv_adapter::CsvPriceAdapter;
use basketrisk::adapters::file_config_adapter::FileConfigAdapter;
use basketrisk::cli::{self, Cli, Command};
use basketrisk::domain::error::{BasketError, TickerListError};
use clap::Parser;
use common::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[data]
dir = ./prices
adjusted = false

[analysis]
tickers = MSFT, AAPL NVDA
benchmark = SPY
start_date = 2023-01-01
end_date = 2023-12-31
window = 20
risk_free_rate = 0.03
return_mode = simple
missing_policy = ffill
index_method = return

[presets]
chips = NVDA AMD INTC
banks = JPM, BAC

[report]
output_dir = out
"#;

/// Price files for AAA, BBB and SPY plus an INI pointing at them.
fn fixture(window: usize) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("prices");
    std::fs::create_dir(&data).unwrap();
    let start = date(2023, 1, 2);
    write_price_csv(&data, "AAA", start, &synthetic_closes(90, 0.0, 0.002));
    write_price_csv(&data, "BBB", start, &synthetic_closes(90, 2.0, 0.001));
    write_price_csv(&data, "SPY", start, &synthetic_closes(90, 1.0, 0.0015));

    let ini = format!(
        "[data]\ndir = {}\n\n[analysis]\ntickers = AAA BBB\nbenchmark = SPY\n\
         start_date = 2023-01-01\nend_date = 2023-12-31\nwindow = {}\n\n\
         [report]\noutput_dir = {}\n",
        data.display(),
        window,
        dir.path().join("report").display()
    );
    let ini_path = dir.path().join("basket.ini");
    std::fs::write(&ini_path, ini).unwrap();
    (dir, ini_path)
}

mod parsing {
    use super::*;

    #[test]
    fn analyze_with_overrides() {
        let cli = Cli::try_parse_from([
            "basketrisk",
            "-vv",
            "analyze",
            "--config",
            "basket.ini",
            "--tickers",
            "aapl,msft",
            "--window",
            "30",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Analyze {
                config,
                tickers,
                window,
                dry_run,
                preset,
                output,
            } => {
                assert_eq!(config, PathBuf::from("basket.ini"));
                assert_eq!(tickers.as_deref(), Some("aapl,msft"));
                assert_eq!(window, Some(30));
                assert!(dry_run);
                assert_eq!(preset, None);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tickers_and_preset_conflict() {
        let result = Cli::try_parse_from([
            "basketrisk",
            "analyze",
            "-c",
            "basket.ini",
            "--tickers",
            "AAPL",
            "--preset",
            "chips",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn other_subcommands() {
        let cli =
            Cli::try_parse_from(["basketrisk", "list-tickers", "--data-dir", "prices"]).unwrap();
        assert!(matches!(cli.command, Command::ListTickers { data_dir } if data_dir == Path::new("prices")));

        let cli = Cli::try_parse_from(["basketrisk", "validate", "--config", "a.ini"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { .. }));

        let cli = Cli::try_parse_from([
            "basketrisk",
            "info",
            "--data-dir",
            "prices",
            "--tickers",
            "AAPL MSFT",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Info { tickers, .. } if tickers == "AAPL MSFT"));
    }

    #[test]
    fn analyze_requires_config() {
        assert!(Cli::try_parse_from(["basketrisk", "analyze"]).is_err());
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn build_config_from_file() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_config(&adapter, None, None, None).unwrap();

        assert_eq!(config.tickers, tickers(&["AAPL", "MSFT", "NVDA"]));
        assert_eq!(config.benchmark.as_deref(), Some("SPY"));
        assert_eq!(config.window, 20);
        assert_eq!(config.start_date, date(2023, 1, 1));
        assert_eq!(config.end_date, date(2023, 12, 31));
        assert!((config.risk_free_rate - 0.03).abs() < f64::EPSILON);
    }

    #[test]
    fn command_line_overrides_file() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();

        let config = cli::build_config(&adapter, Some("tsla  f"), None, Some(5)).unwrap();
        assert_eq!(config.tickers, tickers(&["F", "TSLA"]));
        assert_eq!(config.window, 5);

        let config = cli::build_config(&adapter, None, Some("chips"), None).unwrap();
        assert_eq!(config.tickers, tickers(&["AMD", "INTC", "NVDA"]));
    }

    #[test]
    fn window_override_is_validated() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let err = cli::build_config(&adapter, None, None, Some(1)).unwrap_err();
        assert!(matches!(err, BasketError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn resolve_tickers_errors() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert!(matches!(
            cli::resolve_tickers(Some("AAPL,aapl"), None, &adapter),
            Err(BasketError::TickerList(TickerListError::Duplicate(_)))
        ));
        assert!(matches!(
            cli::resolve_tickers(None, Some("energy"), &adapter),
            Err(BasketError::TickerList(TickerListError::UnknownPreset(_)))
        ));
        assert_eq!(cli::resolve_tickers(None, None, &adapter).unwrap(), None);
    }

    #[test]
    fn output_dir_precedence() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(
            cli::output_dir(Some(Path::new("cli_out")), &adapter),
            PathBuf::from("cli_out")
        );
        assert_eq!(cli::output_dir(None, &adapter), PathBuf::from("out"));

        let bare = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        assert_eq!(
            cli::output_dir(None, &bare),
            PathBuf::from(cli::DEFAULT_OUTPUT_DIR)
        );
    }

    #[test]
    fn load_config_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert!(cli::build_config(&adapter, None, None, None).is_ok());
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(Path::new("/nonexistent/basket.ini")).unwrap_err();
        assert!(matches!(err, BasketError::Io(_)));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn analyze_and_write_reports_from_csv_files() {
        let (dir, ini_path) = fixture(15);
        let adapter = cli::load_config(&ini_path).unwrap();
        let config = cli::build_config(&adapter, None, None, None).unwrap();
        let port = CsvPriceAdapter::new(dir.path().join("prices"));

        let report = cli::analyze(&port, &config).unwrap();
        assert_eq!(report.constituents, tickers(&["AAA", "BBB"]));
        assert_eq!(report.prices.len(), 90);

        let out = cli::output_dir(None, &adapter);
        let written = cli::write_reports(&report, &out).unwrap();
        assert_eq!(written.len(), 14);
        assert!(out.join("rolling_volatility.svg").exists());
        assert!(out.join("summary.csv").exists());
    }

    #[test]
    fn run_analyze_writes_output_directory() {
        let (dir, ini_path) = fixture(15);
        let out = dir.path().join("cli_report");
        let cli = Cli::try_parse_from([
            "basketrisk",
            "analyze",
            "--config",
            ini_path.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .unwrap();
        let _ = cli::run(cli);
        assert!(out.join("drawdown.svg").exists());
        assert!(out.join("index.csv").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (dir, ini_path) = fixture(15);
        let cli = Cli::try_parse_from([
            "basketrisk",
            "analyze",
            "--config",
            ini_path.to_str().unwrap(),
            "--dry-run",
        ])
        .unwrap();
        let _ = cli::run(cli);
        assert!(!dir.path().join("report").exists());
    }

    #[test]
    fn missing_price_file_is_data_unavailable() {
        let (dir, ini_path) = fixture(15);
        let adapter = cli::load_config(&ini_path).unwrap();
        let config = cli::build_config(&adapter, Some("AAA ZZZ"), None, None).unwrap();
        let port = CsvPriceAdapter::new(dir.path().join("prices"));

        let err = cli::analyze(&port, &config).unwrap_err();
        assert!(matches!(err, BasketError::DataUnavailable { ticker, .. } if ticker == "ZZZ"));
    }

    #[test]
    fn window_longer_than_history_fails() {
        let (dir, ini_path) = fixture(200);
        let adapter = cli::load_config(&ini_path).unwrap();
        let config = cli::build_config(&adapter, None, None, None).unwrap();
        let port = CsvPriceAdapter::new(dir.path().join("prices"));

        let err = cli::analyze(&port, &config).unwrap_err();
        assert!(matches!(err, BasketError::InsufficientData { need: 200, .. }));
    }
}
