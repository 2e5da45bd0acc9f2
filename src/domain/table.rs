//! Date-aligned price table and the missing-data policies that resolve its gaps.
//!
//! Rows are the union of all trading dates seen across the input series,
//! columns are tickers. A ticker without a price on some row holds `None`
//! there; nothing is filled or dropped until [`PriceTable::resolve`] is
//! called with an explicit [`MissingDataPolicy`].

use crate::domain::error::BasketError;
use crate::domain::price::{Observation, PriceSeries};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How gaps in an aligned table are resolved before downstream use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingDataPolicy {
    /// Leave gaps in place; downstream windows touching a gap yield no value.
    #[default]
    Keep,
    /// Keep only rows where every ticker has a price.
    DropRows,
    /// Carry the last observed price forward. Leading gaps remain.
    ForwardFill,
    /// Forward fill, then drop rows that are still incomplete.
    ForwardFillThenDrop,
}

impl fmt::Display for MissingDataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingDataPolicy::Keep => write!(f, "keep"),
            MissingDataPolicy::DropRows => write!(f, "drop"),
            MissingDataPolicy::ForwardFill => write!(f, "ffill"),
            MissingDataPolicy::ForwardFillThenDrop => write!(f, "ffill_drop"),
        }
    }
}

impl FromStr for MissingDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(MissingDataPolicy::Keep),
            "drop" => Ok(MissingDataPolicy::DropRows),
            "ffill" => Ok(MissingDataPolicy::ForwardFill),
            "ffill_drop" => Ok(MissingDataPolicy::ForwardFillThenDrop),
            other => Err(format!(
                "unknown missing-data policy {other:?} (expected keep, drop, ffill or ffill_drop)"
            )),
        }
    }
}

/// Sampling frequency of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Daily,
    /// Last observation of each ISO week.
    Weekly,
}

impl Frequency {
    /// Conventional number of periods per year for annualization.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            Frequency::Weekly => 52.0,
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            other => Err(format!("unknown frequency {other:?} (expected daily or weekly)")),
        }
    }
}

/// Checks that dates are strictly increasing and every column spans all rows.
pub(crate) fn validate_layout(
    dates: &[NaiveDate],
    tickers: &[String],
    columns: &[Vec<Option<f64>>],
) -> Result<(), BasketError> {
    let mut seen = HashSet::new();
    for ticker in tickers {
        if !seen.insert(ticker.as_str()) {
            return Err(BasketError::DuplicateTicker(ticker.clone()));
        }
    }
    for (ticker, column) in tickers.iter().zip(columns) {
        if column.len() != dates.len() {
            return Err(BasketError::insufficient(
                format!("column {ticker}"),
                column.len(),
                dates.len(),
            ));
        }
    }
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(BasketError::UnorderedDates {
            ticker: "table index".into(),
            date: w[1],
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Aligns several series onto the union of their dates.
    pub fn align(series: &[PriceSeries]) -> Result<Self, BasketError> {
        if series.is_empty() {
            return Err(BasketError::EmptyInput {
                what: "no price series to align".into(),
            });
        }

        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.dates())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tickers = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            let mut column = vec![None; dates.len()];
            for point in s.points() {
                // Every date of every series is in the union, so the search always hits.
                if let Ok(row) = dates.binary_search(&point.date) {
                    column[row] = Some(point.value);
                }
            }
            tickers.push(s.ticker().to_string());
            columns.push(column);
        }

        validate_layout(&dates, &tickers, &columns)?;
        let table = Self {
            dates,
            tickers,
            columns,
        };
        debug!(
            rows = table.len(),
            tickers = table.width(),
            missing = table.missing_count(),
            "aligned price table"
        );
        Ok(table)
    }

    /// Builds a table from already aligned columns.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, BasketError> {
        let (tickers, columns): (Vec<String>, Vec<Vec<Option<f64>>>) = columns.into_iter().unzip();
        validate_layout(&dates, &tickers, &columns)?;
        Ok(Self {
            dates,
            tickers,
            columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of ticker columns.
    pub fn width(&self) -> usize {
        self.tickers.len()
    }

    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.tickers
            .iter()
            .zip(&self.columns)
            .map(|(t, c)| (t.as_str(), c.as_slice()))
    }

    pub fn row_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn get(&self, date: NaiveDate, ticker: &str) -> Option<f64> {
        let row = self.row_of(date)?;
        self.column(ticker).and_then(|c| c[row])
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().flatten().filter(|v| v.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }

    /// Observed points of one ticker as a series.
    pub fn series(&self, ticker: &str) -> Result<PriceSeries, BasketError> {
        let column = self
            .column(ticker)
            .ok_or_else(|| BasketError::unavailable(ticker, "ticker not in price table"))?;
        let points = self
            .dates
            .iter()
            .zip(column)
            .filter_map(|(&date, v)| v.map(|value| Observation::new(date, value)))
            .collect();
        PriceSeries::new(ticker, points)
    }

    pub fn resolve(&self, policy: MissingDataPolicy) -> Self {
        let resolved = match policy {
            MissingDataPolicy::Keep => self.clone(),
            MissingDataPolicy::DropRows => self.drop_incomplete_rows(),
            MissingDataPolicy::ForwardFill => self.forward_filled(),
            MissingDataPolicy::ForwardFillThenDrop => self.forward_filled().drop_incomplete_rows(),
        };
        debug!(
            %policy,
            rows_before = self.len(),
            rows_after = resolved.len(),
            missing_after = resolved.missing_count(),
            "resolved missing data"
        );
        resolved
    }

    fn forward_filled(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut last = None;
                column
                    .iter()
                    .map(|v| {
                        if v.is_some() {
                            last = *v;
                        }
                        last
                    })
                    .collect()
            })
            .collect();
        Self {
            dates: self.dates.clone(),
            tickers: self.tickers.clone(),
            columns,
        }
    }

    fn drop_incomplete_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.iter().all(|c| c[row].is_some()))
            .collect();
        self.take_rows(&keep)
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            tickers: self.tickers.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| rows.iter().map(|&r| c[r]).collect())
                .collect(),
        }
    }

    /// Removes tickers that have no observation at all.
    pub fn drop_empty_columns(&self) -> Self {
        let (tickers, columns) = self
            .tickers
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| c.iter().any(Option::is_some))
            .map(|(t, c)| (t.clone(), c.clone()))
            .unzip();
        Self {
            dates: self.dates.clone(),
            tickers,
            columns,
        }
    }

    /// Restricts the table to `tickers`, in the order given.
    pub fn select(&self, tickers: &[String]) -> Result<Self, BasketError> {
        let mut columns = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let column = self
                .column(ticker)
                .ok_or_else(|| BasketError::unavailable(ticker, "ticker not in price table"))?;
            columns.push((ticker.clone(), column.to_vec()));
        }
        Self::from_columns(self.dates.clone(), columns)
    }

    /// Rows with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let rows: Vec<usize> = (0..self.len())
            .filter(|&r| self.dates[r] >= start && self.dates[r] <= end)
            .collect();
        self.take_rows(&rows)
    }

    pub fn since(&self, start: NaiveDate) -> Self {
        self.between(start, NaiveDate::MAX)
    }

    /// Downsamples to `frequency`. A weekly row is labelled with the last
    /// trading date of its ISO week and holds each ticker's last observed
    /// price within that week.
    pub fn resample(&self, frequency: Frequency) -> Self {
        if frequency == Frequency::Daily {
            return self.clone();
        }

        let mut dates = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); self.width()];
        let mut current_week = None;

        for (row, date) in self.dates.iter().enumerate() {
            let week = (date.iso_week().year(), date.iso_week().week());
            if current_week != Some(week) {
                current_week = Some(week);
                dates.push(*date);
                for column in columns.iter_mut() {
                    column.push(None);
                }
            }
            if let Some(label) = dates.last_mut() {
                *label = *date;
            }
            for (out, column) in columns.iter_mut().zip(&self.columns) {
                if let (Some(slot), Some(value)) = (out.last_mut(), column[row]) {
                    *slot = Some(value);
                }
            }
        }

        Self {
            dates,
            tickers: self.tickers.clone(),
            columns,
        }
    }

    /// Each column divided by its first observed price, times `base`.
    pub fn rebased(&self, base: f64) -> Result<Self, BasketError> {
        let mut columns = Vec::with_capacity(self.width());
        for (ticker, column) in self.columns() {
            let first = column
                .iter()
                .zip(&self.dates)
                .find_map(|(v, d)| v.map(|v| (*d, v)));
            let column = match first {
                Some((date, price)) if price <= 0.0 => {
                    return Err(BasketError::InvalidPrice {
                        ticker: ticker.to_string(),
                        date,
                        price,
                    });
                }
                Some((_, price)) => column.iter().map(|v| v.map(|v| v / price * base)).collect(),
                None => column.to_vec(),
            };
            columns.push((ticker.to_string(), column));
        }
        Self::from_columns(self.dates.clone(), columns)
    }
}
