//! SVG chart report adapter implementing ReportPort.
//!
//! Writes one standalone `.svg` file per chart into the output directory.
//! Charts without any defined value are skipped.

pub mod chart;
pub mod heatmap;
pub mod histogram;

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::labeled_series::LabeledSeries;
use crate::domain::analysis::AnalysisReport;
use crate::domain::error::BasketError;
use crate::domain::index::EQUAL_WEIGHT_INDEX;
use crate::ports::report_port::ReportPort;
use chart::{ChartOptions, ValueFormat, render_line_chart};
use heatmap::render_heatmap;
use histogram::{DEFAULT_BINS, render_histogram};
use tracing::{debug, info};

pub struct SvgReportAdapter;

impl SvgReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Every chart in output order, rendered. Empty markup means no data.
    fn render(report: &AnalysisReport) -> Vec<(&'static str, String)> {
        let mut charts: Vec<(&'static str, String)> = Self::line_charts(report)
            .into_iter()
            .map(|(name, options, series)| (name, render_line_chart(&series, &options)))
            .collect();

        let mut distribution = vec![LabeledSeries::from_returns(&report.index_returns)];
        distribution.extend(report.benchmark_returns.iter().map(LabeledSeries::from_returns));
        charts.push((
            "return_distribution",
            render_histogram(
                &distribution,
                &ChartOptions {
                    title: "Distribution of period returns".to_string(),
                    format: ValueFormat::Percent,
                    reference_line: Some(0.0),
                },
                DEFAULT_BINS,
            ),
        ));

        charts.push((
            "correlation_matrix",
            report
                .correlation_matrix
                .as_ref()
                .map(|m| render_heatmap(m, "Correlation of constituent returns"))
                .unwrap_or_default(),
        ));
        charts
    }

    fn line_charts(report: &AnalysisReport) -> Vec<(&'static str, ChartOptions, Vec<LabeledSeries>)> {
        let window = report.config.window;
        let percent = |title: String, reference_line| ChartOptions {
            title,
            format: ValueFormat::Percent,
            reference_line,
        };

        let mut comparison = vec![LabeledSeries::from_prices(&report.index_levels)];
        comparison.extend(report.benchmark_levels.iter().map(LabeledSeries::from_prices));

        let mut drawdowns = vec![LabeledSeries::from_drawdown(&report.index_drawdown.series)];
        drawdowns.extend(
            report
                .benchmark_drawdown
                .iter()
                .map(|dd| LabeledSeries::from_drawdown(&dd.series)),
        );

        vec![
            (
                "rolling_volatility",
                percent(format!("Rolling {window}-period annualized volatility"), None),
                report.volatility.iter().map(LabeledSeries::from_rolling).collect(),
            ),
            (
                "rolling_correlation",
                ChartOptions {
                    title: format!("Rolling {window}-period average pairwise correlation"),
                    format: ValueFormat::Number,
                    reference_line: Some(0.0),
                },
                report
                    .average_correlation
                    .iter()
                    .map(LabeledSeries::from_rolling)
                    .collect(),
            ),
            (
                "rolling_sharpe",
                ChartOptions {
                    title: format!("Rolling {window}-period Sharpe ratio"),
                    format: ValueFormat::Number,
                    reference_line: Some(0.0),
                },
                report.sharpe.iter().map(LabeledSeries::from_rolling).collect(),
            ),
            ("drawdown", percent("Drawdown".to_string(), Some(0.0)), drawdowns),
            (
                "index_vs_benchmark",
                ChartOptions {
                    title: format!("{EQUAL_WEIGHT_INDEX} vs benchmark (base {})", report.config.index_base),
                    format: ValueFormat::Number,
                    reference_line: Some(report.config.index_base),
                },
                comparison,
            ),
            (
                "normalized_prices",
                ChartOptions {
                    title: format!("Prices rebased to {}", report.config.index_base),
                    format: ValueFormat::Number,
                    reference_line: Some(report.config.index_base),
                },
                LabeledSeries::from_table(&report.normalized),
            ),
        ]
    }
}

impl Default for SvgReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for SvgReportAdapter {
    fn write(
        &self,
        report: &AnalysisReport,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, BasketError> {
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::new();
        for (name, svg) in Self::render(report) {
            if svg.is_empty() {
                debug!(chart = name, "no data, chart skipped");
                continue;
            }
            let path = output_dir.join(format!("{name}.svg"));
            fs::write(&path, svg)?;
            written.push(path);
        }

        info!(charts = written.len(), dir = %output_dir.display(), "wrote SVG charts");
        Ok(written)
    }
}
