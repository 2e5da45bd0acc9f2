//! Configuration validation and conversion into an [`AnalysisConfig`].
//!
//! Every field is checked before an analysis runs so that a bad INI file
//! fails fast with the offending section and key.

use crate::domain::analysis::{AnalysisConfig, DEFAULT_INDEX_BASE, DEFAULT_WINDOW};
use crate::domain::error::BasketError;
use crate::domain::index::IndexMethod;
use crate::domain::returns::ReturnMode;
use crate::domain::table::{Frequency, MissingDataPolicy};
use crate::domain::universe::{parse_tickers, resolve_preset};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

pub const ANALYSIS: &str = "analysis";
pub const DATA: &str = "data";

/// Checks the whole file, including the `[data]` section.
pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), BasketError> {
    data_dir(config)?;
    build_analysis_config(config, None)?;
    Ok(())
}

/// Reads `[analysis]` into an [`AnalysisConfig`]. `tickers` replaces the
/// file's ticker list or preset when given.
pub fn build_analysis_config(
    config: &dyn ConfigPort,
    tickers: Option<Vec<String>>,
) -> Result<AnalysisConfig, BasketError> {
    let (start_date, end_date) = validate_dates(config)?;
    let tickers = match tickers {
        Some(t) => t,
        None => config_tickers(config)?,
    };

    let frequency: Frequency = parse_field(config, "resample", Frequency::Daily)?;
    let mut analysis = AnalysisConfig::new(tickers, start_date, end_date);
    analysis.frequency = frequency;
    analysis.benchmark = validate_benchmark(config)?;
    analysis.window = validate_window(config.get_int(ANALYSIS, "window", DEFAULT_WINDOW as i64))?;
    analysis.periods_per_year = validate_periods_per_year(config, frequency)?;
    analysis.risk_free_rate = validate_risk_free_rate(config)?;
    analysis.return_mode = parse_field(config, "return_mode", ReturnMode::Simple)?;
    analysis.missing_policy = parse_field(config, "missing_policy", MissingDataPolicy::ForwardFill)?;
    analysis.index_method = parse_field(config, "index_method", IndexMethod::ReturnLevel)?;
    analysis.index_base = validate_index_base(config)?;
    Ok(analysis)
}

/// Rolling windows need at least two observations.
pub fn validate_window(value: i64) -> Result<usize, BasketError> {
    if value < 2 {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "window".to_string(),
            reason: "window must be at least 2".to_string(),
        });
    }
    Ok(value as usize)
}

/// Directory holding the `<TICKER>.csv` price files.
pub fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, BasketError> {
    match config.get_string(DATA, "dir") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Err(BasketError::ConfigMissing {
            section: DATA.to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn config_tickers(config: &dyn ConfigPort) -> Result<Vec<String>, BasketError> {
    if let Some(list) = config.get_string(ANALYSIS, "tickers") {
        return Ok(parse_tickers(&list)?);
    }
    if let Some(preset) = config.get_string(ANALYSIS, "preset") {
        return Ok(resolve_preset(config, &preset)?);
    }
    Err(BasketError::ConfigMissing {
        section: ANALYSIS.to_string(),
        key: "tickers".to_string(),
    })
}

fn validate_benchmark(config: &dyn ConfigPort) -> Result<Option<String>, BasketError> {
    let Some(raw) = config.get_string(ANALYSIS, "benchmark") else {
        return Ok(None);
    };
    let mut parsed = parse_tickers(&raw)?;
    if parsed.len() != 1 {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "benchmark".to_string(),
            reason: "benchmark must be a single ticker".to_string(),
        });
    }
    Ok(parsed.pop())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), BasketError> {
    let start_str = config.get_string(ANALYSIS, "start_date");
    let end_str = config.get_string(ANALYSIS, "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, BasketError> {
    match value {
        None => Err(BasketError::ConfigMissing {
            section: ANALYSIS.to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| BasketError::ConfigInvalid {
                section: ANALYSIS.to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_periods_per_year(
    config: &dyn ConfigPort,
    frequency: Frequency,
) -> Result<f64, BasketError> {
    let value = config.get_double(ANALYSIS, "periods_per_year", frequency.periods_per_year());
    if !(value > 0.0 && value.is_finite()) {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "periods_per_year".to_string(),
            reason: "periods_per_year must be positive".to_string(),
        });
    }
    Ok(value)
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<f64, BasketError> {
    let value = config.get_double(ANALYSIS, "risk_free_rate", 0.0);
    if !(-1.0..1.0).contains(&value) {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be an annual rate between -1 and 1".to_string(),
        });
    }
    Ok(value)
}

fn validate_index_base(config: &dyn ConfigPort) -> Result<f64, BasketError> {
    let value = config.get_double(ANALYSIS, "index_base", DEFAULT_INDEX_BASE);
    if !(value > 0.0 && value.is_finite()) {
        return Err(BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: "index_base".to_string(),
            reason: "index_base must be positive".to_string(),
        });
    }
    Ok(value)
}

fn parse_field<T>(config: &dyn ConfigPort, key: &str, default: T) -> Result<T, BasketError>
where
    T: FromStr<Err = String>,
{
    match config.get_string(ANALYSIS, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|reason| BasketError::ConfigInvalid {
            section: ANALYSIS.to_string(),
            key: key.to_string(),
            reason,
        }),
    }
}
