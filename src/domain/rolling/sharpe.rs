//! Rolling annualized Sharpe ratio.
//!
//! excess = r - risk_free_rate / periods_per_year
//! SHARPE(w)[i] = mean(excess) / stdev(excess) * sqrt(periods_per_year)
//!
//! `risk_free_rate` is annual. A window with zero variance has no Sharpe
//! ratio and yields `None` rather than an infinite value.

use crate::domain::error::BasketError;
use crate::domain::returns::{ReturnSeries, ReturnTable};
use crate::domain::rolling::{
    RollingSeries, RollingStatistic, check_window, mean, roll, sample_stddev,
};
use chrono::NaiveDate;

pub fn rolling_sharpe(
    returns: &ReturnSeries,
    window: usize,
    periods_per_year: f64,
    risk_free_rate: f64,
) -> Result<RollingSeries, BasketError> {
    check_window(&format!("Sharpe ratio of {}", returns.name), returns.len(), window)?;
    let values: Vec<Option<f64>> = returns.points.iter().map(|p| Some(p.value)).collect();
    Ok(sharpe_of(
        &returns.name,
        &returns.dates(),
        &values,
        window,
        periods_per_year,
        risk_free_rate,
    ))
}

pub fn rolling_sharpe_table(
    returns: &ReturnTable,
    window: usize,
    periods_per_year: f64,
    risk_free_rate: f64,
) -> Result<Vec<RollingSeries>, BasketError> {
    check_window("Sharpe ratio of return table", returns.len(), window)?;
    Ok(returns
        .columns()
        .map(|(ticker, column)| {
            sharpe_of(
                ticker,
                returns.dates(),
                column,
                window,
                periods_per_year,
                risk_free_rate,
            )
        })
        .collect())
}

fn sharpe_of(
    name: &str,
    dates: &[NaiveDate],
    values: &[Option<f64>],
    window: usize,
    periods_per_year: f64,
    risk_free_rate: f64,
) -> RollingSeries {
    let per_period_rf = risk_free_rate / periods_per_year;
    let scale = periods_per_year.sqrt();
    let excess: Vec<Option<f64>> = values.iter().map(|v| v.map(|r| r - per_period_rf)).collect();

    RollingSeries {
        name: name.to_string(),
        statistic: RollingStatistic::Sharpe(window),
        points: roll(dates, &excess, window, |w| {
            let sd = sample_stddev(w);
            if sd == 0.0 {
                None
            } else {
                Some(mean(w) / sd * scale)
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::Observation;
    use crate::domain::returns::ReturnMode;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn returns(values: &[f64]) -> ReturnSeries {
        ReturnSeries {
            name: "IDX".into(),
            mode: ReturnMode::Simple,
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation::new(d(i as u32 + 1), v))
                .collect(),
        }
    }

    #[test]
    fn sharpe_known_value() {
        let series = rolling_sharpe(&returns(&[0.01, 0.03, 0.02]), 3, 252.0, 0.0).unwrap();
        // mean 0.02, sample stdev 0.01
        assert_relative_eq!(
            series.points[2].value.unwrap(),
            2.0 * 252.0_f64.sqrt(),
            max_relative = 1e-9
        );
        assert_eq!(series.points[0].value, None);
        assert_eq!(series.points[1].value, None);
    }

    #[test]
    fn zero_variance_window_is_undefined() {
        let series = rolling_sharpe(&returns(&[0.01; 6]), 3, 252.0, 0.0).unwrap();
        assert_eq!(series.len(), 6);
        assert!(series.points.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn zero_variance_with_risk_free_is_still_undefined() {
        let series = rolling_sharpe(&returns(&[0.02; 4]), 2, 252.0, 0.05).unwrap();
        assert_eq!(series.defined_count(), 0);
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let r = returns(&[0.01, 0.03, 0.02]);
        let plain = rolling_sharpe(&r, 3, 252.0, 0.0).unwrap();
        let net = rolling_sharpe(&r, 3, 252.0, 0.0252).unwrap();
        // 0.0252 / 252 = 0.0001 per period off the mean; stdev unchanged
        assert_relative_eq!(
            net.points[2].value.unwrap(),
            (0.02 - 0.0001) / 0.01 * 252.0_f64.sqrt(),
            max_relative = 1e-9
        );
        assert!(net.points[2].value.unwrap() < plain.points[2].value.unwrap());
    }

    #[test]
    fn table_variant_names_each_column() {
        let table = ReturnTable::from_columns(
            ReturnMode::Simple,
            (1..=3).map(d).collect(),
            vec![
                ("A".into(), vec![Some(0.01), Some(0.03), Some(0.02)]),
                ("B".into(), vec![Some(0.01), Some(0.01), Some(0.01)]),
            ],
        )
        .unwrap();
        let sharpes = rolling_sharpe_table(&table, 3, 252.0, 0.0).unwrap();
        assert_eq!(sharpes[0].name, "A");
        assert!(sharpes[0].points[2].value.is_some());
        assert_eq!(sharpes[1].points[2].value, None);
    }
}
