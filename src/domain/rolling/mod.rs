//! Trailing-window statistics over return series.
//!
//! This module provides types shared by every rolling statistic:
//! - `RollingPoint`: one date with an optional value
//! - `RollingStatistic`: statistic identity + window (usable as a HashMap key)
//! - `RollingSeries`: a named, date-aligned sequence of points
//!
//! Every statistic keeps one point per input date. The first `window - 1`
//! points, and any point whose window touches a missing return, carry `None`.

pub mod correlation;
pub mod sharpe;
pub mod volatility;

use crate::domain::error::BasketError;
use chrono::NaiveDate;
use std::fmt;

pub use correlation::{CorrelationMatrix, correlation_matrix, rolling_average_correlation};
pub use sharpe::{rolling_sharpe, rolling_sharpe_table};
pub use volatility::{rolling_volatility, rolling_volatility_table};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollingStatistic {
    Volatility(usize),
    AverageCorrelation(usize),
    Sharpe(usize),
}

impl RollingStatistic {
    pub fn window(&self) -> usize {
        match self {
            RollingStatistic::Volatility(w)
            | RollingStatistic::AverageCorrelation(w)
            | RollingStatistic::Sharpe(w) => *w,
        }
    }
}

impl fmt::Display for RollingStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollingStatistic::Volatility(w) => write!(f, "VOLATILITY({})", w),
            RollingStatistic::AverageCorrelation(w) => write!(f, "AVG_CORRELATION({})", w),
            RollingStatistic::Sharpe(w) => write!(f, "SHARPE({})", w),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    pub name: String,
    pub statistic: RollingStatistic,
    pub points: Vec<RollingPoint>,
}

impl RollingSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Most recent defined value.
    pub fn latest(&self) -> Option<RollingPoint> {
        self.points.iter().rev().find(|p| p.value.is_some()).copied()
    }
}

pub(crate) fn check_window(what: &str, len: usize, window: usize) -> Result<(), BasketError> {
    if window < 2 {
        return Err(BasketError::InvalidWindow { window });
    }
    if len == 0 {
        return Err(BasketError::EmptyInput {
            what: format!("{what} has no returns"),
        });
    }
    if len < window {
        return Err(BasketError::insufficient(what, len, window));
    }
    Ok(())
}

/// Applies `stat` to each complete trailing window of `values`.
pub(crate) fn roll(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    window: usize,
    stat: impl Fn(&[f64]) -> Option<f64>,
) -> Vec<RollingPoint> {
    let mut buffer = Vec::with_capacity(window);
    dates
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let value = if i + 1 < window {
                None
            } else {
                buffer.clear();
                buffer.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));
                if buffer.len() == window {
                    stat(&buffer)
                } else {
                    None
                }
            };
            RollingPoint { date, value }
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Exactly 0 when all values
/// are equal, so zero-variance windows are detected without rounding noise.
pub(crate) fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
