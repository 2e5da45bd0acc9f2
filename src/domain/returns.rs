//! Periodic returns from prices, and levels back from returns.
//!
//! simple:      r[t] = P[t] / P[t-1] - 1
//! logarithmic: r[t] = ln(P[t] / P[t-1])
//!
//! The first date has no return, so a series of n prices yields n - 1 returns.

use crate::domain::error::BasketError;
use crate::domain::price::{Observation, PriceSeries};
use crate::domain::table::{PriceTable, validate_layout};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnMode {
    #[default]
    Simple,
    Log,
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnMode::Simple => write!(f, "simple"),
            ReturnMode::Log => write!(f, "log"),
        }
    }
}

impl FromStr for ReturnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(ReturnMode::Simple),
            "log" | "logarithmic" => Ok(ReturnMode::Log),
            other => Err(format!("unknown return mode {other:?} (expected simple or log)")),
        }
    }
}

/// Returns of one ticker (or of a composite index).
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub name: String,
    pub mode: ReturnMode,
    pub points: Vec<Observation>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

/// Per-column returns on a shared date index. `None` where either
/// neighbouring price is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    mode: ReturnMode,
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl ReturnTable {
    pub fn from_columns(
        mode: ReturnMode,
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, BasketError> {
        let (tickers, columns): (Vec<String>, Vec<Vec<Option<f64>>>) = columns.into_iter().unzip();
        validate_layout(&dates, &tickers, &columns)?;
        Ok(Self {
            mode,
            dates,
            tickers,
            columns,
        })
    }

    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

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

    /// Observed returns of one ticker as a series.
    pub fn series(&self, ticker: &str) -> Result<ReturnSeries, BasketError> {
        let column = self
            .column(ticker)
            .ok_or_else(|| BasketError::unavailable(ticker, "ticker not in return table"))?;
        Ok(ReturnSeries {
            name: ticker.to_string(),
            mode: self.mode,
            points: self
                .dates
                .iter()
                .zip(column)
                .filter_map(|(&date, v)| v.map(|value| Observation::new(date, value)))
                .collect(),
        })
    }

    pub fn select(&self, tickers: &[String]) -> Result<Self, BasketError> {
        let mut columns = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let column = self
                .column(ticker)
                .ok_or_else(|| BasketError::unavailable(ticker, "ticker not in return table"))?;
            columns.push((ticker.clone(), column.to_vec()));
        }
        Self::from_columns(self.mode, self.dates.clone(), columns)
    }
}

fn period_return(
    ticker: &str,
    date: NaiveDate,
    prev: f64,
    curr: f64,
    mode: ReturnMode,
) -> Result<f64, BasketError> {
    match mode {
        ReturnMode::Simple => {
            if prev == 0.0 {
                return Err(BasketError::InvalidPrice {
                    ticker: ticker.to_string(),
                    date,
                    price: prev,
                });
            }
            Ok(curr / prev - 1.0)
        }
        ReturnMode::Log => {
            if prev <= 0.0 || curr <= 0.0 {
                return Err(BasketError::InvalidPrice {
                    ticker: ticker.to_string(),
                    date,
                    price: if prev <= 0.0 { prev } else { curr },
                });
            }
            Ok((curr / prev).ln())
        }
    }
}

pub fn calculate_returns(prices: &PriceSeries, mode: ReturnMode) -> Result<ReturnSeries, BasketError> {
    if prices.len() < 2 {
        return Err(BasketError::insufficient(
            format!("returns of {}", prices.ticker()),
            prices.len(),
            2,
        ));
    }
    if mode == ReturnMode::Log {
        prices.ensure_positive()?;
    }

    let points = prices
        .points()
        .windows(2)
        .map(|w| {
            period_return(prices.ticker(), w[1].date, w[0].value, w[1].value, mode)
                .map(|r| Observation::new(w[1].date, r))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReturnSeries {
        name: prices.ticker().to_string(),
        mode,
        points,
    })
}

/// Returns of every column, independently.
pub fn calculate_table_returns(
    prices: &PriceTable,
    mode: ReturnMode,
) -> Result<ReturnTable, BasketError> {
    if prices.len() < 2 {
        return Err(BasketError::insufficient("returns of price table", prices.len(), 2));
    }

    let dates = prices.dates();
    let mut columns = Vec::with_capacity(prices.width());
    for (ticker, column) in prices.columns() {
        if mode == ReturnMode::Log {
            if let Some((row, v)) = column
                .iter()
                .enumerate()
                .find_map(|(row, v)| v.filter(|&v| v <= 0.0).map(|v| (row, v)))
            {
                return Err(BasketError::InvalidPrice {
                    ticker: ticker.to_string(),
                    date: dates[row],
                    price: v,
                });
            }
        }

        let mut returns = Vec::with_capacity(column.len() - 1);
        for row in 1..column.len() {
            let value = match (column[row - 1], column[row]) {
                (Some(prev), Some(curr)) => {
                    Some(period_return(ticker, dates[row], prev, curr, mode)?)
                }
                _ => None,
            };
            returns.push(value);
        }
        columns.push((ticker.to_string(), returns));
    }

    ReturnTable::from_columns(mode, dates[1..].to_vec(), columns)
}

/// Rebuilds a level series from returns, anchored at `base` on `start_date`.
pub fn compound(
    returns: &ReturnSeries,
    start_date: NaiveDate,
    base: f64,
) -> Result<PriceSeries, BasketError> {
    let mut points = Vec::with_capacity(returns.len() + 1);
    points.push(Observation::new(start_date, base));

    match returns.mode {
        ReturnMode::Simple => {
            let mut level = base;
            for r in &returns.points {
                level *= 1.0 + r.value;
                points.push(Observation::new(r.date, level));
            }
        }
        ReturnMode::Log => {
            let mut cumulative = 0.0;
            for r in &returns.points {
                cumulative += r.value;
                points.push(Observation::new(r.date, base * cumulative.exp()));
            }
        }
    }

    PriceSeries::new(returns.name.clone(), points)
}
