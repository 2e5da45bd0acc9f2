//! Equal-weight composite index construction.
//!
//! Two readings of "equal weight" are supported:
//!
//! - [`IndexMethod::ReturnLevel`]: rebalanced every period. The composite
//!   return on a date is the mean of the constituents' returns that date.
//!   A constituent without a return on a date is left out and the weights
//!   are renormalized over the rest, so effective exposure shifts on those
//!   dates. Dates where no constituent has a return are omitted.
//! - [`IndexMethod::PriceLevel`]: buy-and-hold. Each constituent is rebased
//!   to the same starting value on the first date all of them trade, then
//!   the rebased prices are averaged. Only dates where every constituent has
//!   a price are kept (intersection), and weights drift with performance.

use crate::domain::error::BasketError;
use crate::domain::price::{Observation, PriceSeries};
use crate::domain::returns::{ReturnSeries, ReturnTable};
use crate::domain::table::PriceTable;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const EQUAL_WEIGHT_INDEX: &str = "equal_weight_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMethod {
    #[default]
    ReturnLevel,
    PriceLevel,
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexMethod::ReturnLevel => write!(f, "return"),
            IndexMethod::PriceLevel => write!(f, "price"),
        }
    }
}

impl FromStr for IndexMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "return" | "return_level" | "rebalanced" => Ok(IndexMethod::ReturnLevel),
            "price" | "price_level" | "buy_and_hold" => Ok(IndexMethod::PriceLevel),
            other => Err(format!("unknown index method {other:?} (expected return or price)")),
        }
    }
}

/// Keeps the requested constituents that exist in `available` and have any
/// data. A ticker listed more than once counts once.
fn filter_constituents<'a>(
    constituents: &[String],
    available: impl Fn(&str) -> Option<&'a [Option<f64>]>,
) -> Result<Vec<String>, BasketError> {
    let mut kept: Vec<String> = Vec::with_capacity(constituents.len());
    for ticker in constituents {
        if kept.contains(ticker) {
            warn!(%ticker, "constituent listed more than once, repeat ignored");
            continue;
        }
        match available(ticker.as_str()) {
            Some(column) if column.iter().any(Option::is_some) => kept.push(ticker.clone()),
            Some(_) => warn!(%ticker, "constituent has no observations, excluded from index"),
            None => warn!(%ticker, "constituent not in table, excluded from index"),
        }
    }
    if kept.is_empty() {
        return Err(BasketError::EmptyUniverse);
    }
    Ok(kept)
}

/// Composite return per date, rebalanced to equal weights every period.
pub fn equal_weight_returns(
    returns: &ReturnTable,
    constituents: &[String],
) -> Result<ReturnSeries, BasketError> {
    let kept = filter_constituents(constituents, |t| returns.column(t))?;
    let columns: Vec<&[Option<f64>]> = kept.iter().filter_map(|t| returns.column(t)).collect();

    let mut points = Vec::with_capacity(returns.len());
    let mut partial_dates = 0usize;
    for (row, &date) in returns.dates().iter().enumerate() {
        let observed: Vec<f64> = columns.iter().filter_map(|c| c[row]).collect();
        if observed.is_empty() {
            continue;
        }
        if observed.len() < columns.len() {
            partial_dates += 1;
        }
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        points.push(Observation::new(date, mean));
    }

    if partial_dates > 0 {
        debug!(
            partial_dates,
            constituents = columns.len(),
            "renormalized index weights on dates with missing constituents"
        );
    }

    Ok(ReturnSeries {
        name: EQUAL_WEIGHT_INDEX.to_string(),
        mode: returns.mode(),
        points,
    })
}

/// Mean of constituent prices rebased to `base` at the first shared date.
pub fn equal_weight_prices(
    prices: &PriceTable,
    constituents: &[String],
    base: f64,
) -> Result<PriceSeries, BasketError> {
    let kept = filter_constituents(constituents, |t| prices.column(t))?;
    let columns: Vec<&[Option<f64>]> = kept.iter().filter_map(|t| prices.column(t)).collect();

    let shared_rows: Vec<usize> = (0..prices.len())
        .filter(|&row| columns.iter().all(|c| c[row].is_some()))
        .collect();
    let Some(&first_row) = shared_rows.first() else {
        return Err(BasketError::EmptyInput {
            what: "constituents share no trading date".into(),
        });
    };

    let mut anchors = Vec::with_capacity(columns.len());
    for (ticker, column) in kept.iter().zip(&columns) {
        let anchor = column[first_row].unwrap_or_default();
        if anchor <= 0.0 {
            return Err(BasketError::InvalidPrice {
                ticker: ticker.clone(),
                date: prices.dates()[first_row],
                price: anchor,
            });
        }
        anchors.push(anchor);
    }

    let points = shared_rows
        .iter()
        .map(|&row| {
            let total: f64 = columns
                .iter()
                .zip(&anchors)
                .map(|(c, anchor)| c[row].unwrap_or_default() / anchor * base)
                .sum();
            Observation::new(prices.dates()[row], total / columns.len() as f64)
        })
        .collect();

    PriceSeries::new(EQUAL_WEIGHT_INDEX, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::returns::ReturnMode;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn return_level_is_arithmetic_mean() {
        let returns = ReturnTable::from_columns(
            ReturnMode::Simple,
            vec![d(1)],
            vec![
                ("A".into(), vec![Some(0.02)]),
                ("B".into(), vec![Some(0.04)]),
                ("C".into(), vec![Some(0.06)]),
            ],
        )
        .unwrap();
        let index = equal_weight_returns(&returns, &names(&["A", "B", "C"])).unwrap();
        assert_eq!(index.len(), 1);
        assert_relative_eq!(index.points[0].value, 0.04, max_relative = 1e-12);
        assert_eq!(index.name, EQUAL_WEIGHT_INDEX);
    }

    #[test]
    fn return_level_renormalizes_over_present_constituents() {
        let returns = ReturnTable::from_columns(
            ReturnMode::Simple,
            vec![d(1), d(2), d(3)],
            vec![
                ("A".into(), vec![Some(0.01), None, None]),
                ("B".into(), vec![Some(0.03), Some(0.05), None]),
            ],
        )
        .unwrap();
        let index = equal_weight_returns(&returns, &names(&["A", "B"])).unwrap();
        assert_eq!(index.dates(), vec![d(1), d(2)]);
        assert_relative_eq!(index.points[0].value, 0.02, max_relative = 1e-12);
        assert_relative_eq!(index.points[1].value, 0.05, max_relative = 1e-12);
    }

    #[test]
    fn zero_constituents_is_empty_universe() {
        let returns = ReturnTable::from_columns(
            ReturnMode::Simple,
            vec![d(1)],
            vec![("A".into(), vec![Some(0.01)])],
        )
        .unwrap();
        assert!(matches!(
            equal_weight_returns(&returns, &[]),
            Err(BasketError::EmptyUniverse)
        ));
        assert!(matches!(
            equal_weight_returns(&returns, &names(&["ZZZ"])),
            Err(BasketError::EmptyUniverse)
        ));
    }

    #[test]
    fn unknown_constituent_is_filtered_out() {
        let returns = ReturnTable::from_columns(
            ReturnMode::Simple,
            vec![d(1)],
            vec![("A".into(), vec![Some(0.01)])],
        )
        .unwrap();
        let index = equal_weight_returns(&returns, &names(&["A", "ZZZ"])).unwrap();
        assert_relative_eq!(index.points[0].value, 0.01);
    }

    #[test]
    fn repeated_constituent_counts_once() {
        let returns = ReturnTable::from_columns(
            ReturnMode::Simple,
            vec![d(1)],
            vec![
                ("A".into(), vec![Some(0.02)]),
                ("B".into(), vec![Some(0.06)]),
            ],
        )
        .unwrap();
        let index = equal_weight_returns(&returns, &names(&["A", "A", "B"])).unwrap();
        assert_relative_eq!(index.points[0].value, 0.04, max_relative = 1e-12);

        let prices = PriceTable::from_columns(
            vec![d(1), d(2)],
            vec![
                ("A".into(), vec![Some(10.0), Some(20.0)]),
                ("B".into(), vec![Some(40.0), Some(40.0)]),
            ],
        )
        .unwrap();
        let index = equal_weight_prices(&prices, &names(&["B", "A", "B"]), 100.0).unwrap();
        // A: 200, B: 100
        assert_relative_eq!(index.points()[1].value, 150.0, max_relative = 1e-12);
    }

    #[test]
    fn price_level_rebases_then_averages() {
        let prices = PriceTable::from_columns(
            vec![d(1), d(2), d(3)],
            vec![
                ("A".into(), vec![None, Some(10.0), Some(12.0)]),
                ("B".into(), vec![Some(40.0), Some(50.0), Some(45.0)]),
            ],
        )
        .unwrap();
        let index = equal_weight_prices(&prices, &names(&["A", "B"]), 100.0).unwrap();
        assert_eq!(index.dates().collect::<Vec<_>>(), vec![d(2), d(3)]);
        assert_relative_eq!(index.points()[0].value, 100.0, max_relative = 1e-12);
        // A: 120, B: 90
        assert_relative_eq!(index.points()[1].value, 105.0, max_relative = 1e-12);
    }

    #[test]
    fn price_level_without_shared_date_fails() {
        let prices = PriceTable::from_columns(
            vec![d(1), d(2)],
            vec![
                ("A".into(), vec![Some(1.0), None]),
                ("B".into(), vec![None, Some(1.0)]),
            ],
        )
        .unwrap();
        assert!(matches!(
            equal_weight_prices(&prices, &names(&["A", "B"]), 1.0),
            Err(BasketError::EmptyInput { .. })
        ));
    }

    #[test]
    fn price_level_empty_universe() {
        let prices =
            PriceTable::from_columns(vec![d(1)], vec![("A".into(), vec![Some(1.0)])]).unwrap();
        assert!(matches!(
            equal_weight_prices(&prices, &[], 100.0),
            Err(BasketError::EmptyUniverse)
        ));
    }

    #[test]
    fn method_parses() {
        assert_eq!("price".parse(), Ok(IndexMethod::PriceLevel));
        assert_eq!("Return_Level".parse(), Ok(IndexMethod::ReturnLevel));
        assert_eq!(IndexMethod::default(), IndexMethod::ReturnLevel);
    }
}
