//! CSV file price adapter: one `<TICKER>.csv` per ticker under a base directory.
//!
//! Columns are addressed by header name (`date`, `close`, `adj_close`), so
//! extra columns such as open/high/low/volume are ignored. Header names are
//! matched case-insensitively with spaces read as underscores, which accepts
//! the common "Adj Close" export format.

use crate::domain::error::BasketError;
use crate::domain::price::{Observation, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
    adjusted: bool,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            adjusted: false,
        }
    }

    /// Read `adj_close` instead of `close`.
    pub fn adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read_all(&self, ticker: &str) -> Result<Vec<Observation>, BasketError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            BasketError::unavailable(ticker, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| BasketError::unavailable(ticker, format!("CSV header error: {}", e)))?
            .iter()
            .map(|h| h.trim().to_lowercase().replace(' ', "_"))
            .collect();
        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                BasketError::unavailable(ticker, format!("missing {} column", name))
            })
        };
        let date_idx = column("date")?;
        let price_idx = column(if self.adjusted { "adj_close" } else { "close" })?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| BasketError::unavailable(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_idx).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                BasketError::unavailable(
                    ticker,
                    format!("invalid date {:?} on row {}: {}", date_str, line + 1, e),
                )
            })?;

            let price_str = record.get(price_idx).unwrap_or_default().trim();
            if price_str.is_empty() || price_str.eq_ignore_ascii_case("null") {
                debug!(%ticker, %date, "skipping row without a price");
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| {
                BasketError::unavailable(
                    ticker,
                    format!("invalid price {:?} on row {}: {}", price_str, line + 1, e),
                )
            })?;

            points.push(Observation::new(date, price));
        }
        Ok(points)
    }
}

impl PriceDataPort for CsvPriceAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BasketError> {
        let points = self
            .read_all(ticker)?
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();
        let series = PriceSeries::from_unsorted(ticker, points)?;
        series.ensure_positive()?;
        debug!(%ticker, rows = series.len(), "loaded prices");
        Ok(series)
    }

    fn list_tickers(&self) -> Result<Vec<String>, BasketError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut tickers = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    tickers.push(stem.to_string_lossy().to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BasketError> {
        let series = PriceSeries::from_unsorted(ticker, self.read_all(ticker)?)?;
        Ok(match (series.first(), series.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, series.len())),
            _ => None,
        })
    }
}
