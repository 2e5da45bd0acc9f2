//! CSV report adapter implementing ReportPort.
//!
//! Files written:
//! - `prices.csv`: resolved prices, one column per ticker
//! - `index.csv`: index level, return and drawdown, plus the benchmark level
//! - `rolling.csv`: every rolling statistic, one column each
//! - `correlation_matrix.csv`: full-sample correlations, when available
//! - `summary.csv`: total return per series, best first
//! - `drawdowns.csv`: maximum drawdown of the index and benchmark

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::labeled_series::{LabeledSeries, outer_join};
use crate::domain::analysis::AnalysisReport;
use crate::domain::error::BasketError;
use crate::domain::index::EQUAL_WEIGHT_INDEX;
use crate::ports::report_port::ReportPort;
use tracing::info;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> BasketError {
    BasketError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `series` side by side on the union of their dates. Undefined
/// values are empty cells.
fn write_wide(path: &Path, series: &[LabeledSeries]) -> Result<(), BasketError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    let mut header = vec!["date".to_string()];
    header.extend(series.iter().map(|s| s.label.clone()));
    wtr.write_record(&header).map_err(|e| csv_error(path, e))?;

    for (date, values) in outer_join(series) {
        let mut record = vec![date.to_string()];
        record.extend(values.into_iter().map(format_value));
        wtr.write_record(&record).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_rows(path: &Path, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), BasketError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(header).map_err(|e| csv_error(path, e))?;
    for row in rows {
        wtr.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        report: &AnalysisReport,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BasketError> {
        fs::create_dir_all(output_dir)?;
        let mut written = Vec::new();

        let path = output_dir.join("prices.csv");
        write_wide(&path, &LabeledSeries::from_table(&report.prices))?;
        written.push(path);

        let mut index = vec![
            LabeledSeries::from_prices(&report.index_levels).with_label(EQUAL_WEIGHT_INDEX),
            LabeledSeries::from_returns(&report.index_returns).with_label("index_return"),
            LabeledSeries::from_drawdown(&report.index_drawdown.series).with_label("index_drawdown"),
        ];
        if let Some(levels) = &report.benchmark_levels {
            let label = format!("benchmark_{}", levels.ticker());
            index.push(LabeledSeries::from_prices(levels).with_label(label));
        }
        let path = output_dir.join("index.csv");
        write_wide(&path, &index)?;
        written.push(path);

        let rolling: Vec<LabeledSeries> = report
            .volatility
            .iter()
            .chain(&report.sharpe)
            .chain(&report.average_correlation)
            .map(LabeledSeries::from_rolling)
            .collect();
        let path = output_dir.join("rolling.csv");
        write_wide(&path, &rolling)?;
        written.push(path);

        if let Some(matrix) = &report.correlation_matrix {
            let mut header = vec![""];
            header.extend(matrix.tickers.iter().map(String::as_str));
            let rows = matrix
                .tickers
                .iter()
                .zip(&matrix.values)
                .map(|(ticker, row)| {
                    std::iter::once(ticker.clone())
                        .chain(row.iter().copied().map(format_value))
                        .collect()
                })
                .collect();
            let path = output_dir.join("correlation_matrix.csv");
            write_rows(&path, &header, rows)?;
            written.push(path);
        }

        let rows = report
            .performance
            .iter()
            .map(|row| {
                vec![
                    row.name.clone(),
                    row.start_price.to_string(),
                    row.end_price.to_string(),
                    row.total_return.to_string(),
                ]
            })
            .collect();
        let path = output_dir.join("summary.csv");
        write_rows(&path, &["name", "start_price", "end_price", "total_return"], rows)?;
        written.push(path);

        let mut drawdowns = vec![(EQUAL_WEIGHT_INDEX.to_string(), &report.index_drawdown)];
        if let (Some(dd), Some(levels)) = (&report.benchmark_drawdown, &report.benchmark_levels) {
            drawdowns.push((levels.ticker().to_string(), dd));
        }
        let rows = drawdowns
            .into_iter()
            .map(|(name, dd)| {
                vec![
                    name,
                    dd.max.depth.to_string(),
                    dd.max.peak_date.to_string(),
                    dd.max.trough_date.to_string(),
                    dd.max.recovery_date.map(|d| d.to_string()).unwrap_or_default(),
                    dd.max.duration.to_string(),
                ]
            })
            .collect();
        let path = output_dir.join("drawdowns.csv");
        write_rows(
            &path,
            &["name", "max_drawdown", "peak_date", "trough_date", "recovery_date", "duration"],
            rows,
        )?;
        written.push(path);

        info!(files = written.len(), dir = %output_dir.display(), "wrote CSV report");
        Ok(written)
    }
}
