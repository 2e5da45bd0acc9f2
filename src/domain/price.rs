//! Dated observations and single-ticker price series.

use crate::domain::error::BasketError;
use chrono::NaiveDate;

/// One dated value: a price, a return or an index level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Price history of one ticker with strictly increasing dates and finite prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<Observation>,
}

impl PriceSeries {
    /// Validates ordering and finiteness. Positivity is checked by the
    /// operations that need it (log returns, drawdowns).
    pub fn new(ticker: impl Into<String>, points: Vec<Observation>) -> Result<Self, BasketError> {
        let ticker = ticker.into();
        for (i, point) in points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(BasketError::InvalidPrice {
                    ticker,
                    date: point.date,
                    price: point.value,
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(BasketError::UnorderedDates {
                    ticker,
                    date: point.date,
                });
            }
        }
        Ok(Self { ticker, points })
    }

    /// Sorts by date first; duplicate dates are still rejected.
    pub fn from_unsorted(
        ticker: impl Into<String>,
        mut points: Vec<Observation>,
    ) -> Result<Self, BasketError> {
        points.sort_by_key(|p| p.date);
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Fails with `InvalidPrice` on the first price that is not strictly positive.
    pub fn ensure_positive(&self) -> Result<(), BasketError> {
        match self.points.iter().find(|p| p.value <= 0.0) {
            Some(p) => Err(BasketError::InvalidPrice {
                ticker: self.ticker.clone(),
                date: p.date,
                price: p.value,
            }),
            None => Ok(()),
        }
    }

    /// Total return between the first and last observation.
    pub fn total_return(&self) -> Option<f64> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() >= 2 && first.value != 0.0 => {
                Some(last.value / first.value - 1.0)
            }
            _ => None,
        }
    }
}
