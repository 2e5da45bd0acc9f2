//! Rolling annualized volatility.
//!
//! VOL(w)[i] = stdev(r[i-w+1..=i]) * sqrt(periods_per_year)
//! Sample standard deviation. Warmup: first (w-1) points are undefined.

use crate::domain::error::BasketError;
use crate::domain::returns::{ReturnSeries, ReturnTable};
use crate::domain::rolling::{
    RollingSeries, RollingStatistic, check_window, roll, sample_stddev,
};

pub fn rolling_volatility(
    returns: &ReturnSeries,
    window: usize,
    periods_per_year: f64,
) -> Result<RollingSeries, BasketError> {
    check_window(&format!("volatility of {}", returns.name), returns.len(), window)?;
    let values: Vec<Option<f64>> = returns.points.iter().map(|p| Some(p.value)).collect();
    Ok(volatility_of(
        &returns.name,
        &returns.dates(),
        &values,
        window,
        periods_per_year,
    ))
}

/// One volatility series per column, all on the table's date index.
pub fn rolling_volatility_table(
    returns: &ReturnTable,
    window: usize,
    periods_per_year: f64,
) -> Result<Vec<RollingSeries>, BasketError> {
    check_window("volatility of return table", returns.len(), window)?;
    Ok(returns
        .columns()
        .map(|(ticker, column)| {
            volatility_of(ticker, returns.dates(), column, window, periods_per_year)
        })
        .collect())
}

fn volatility_of(
    name: &str,
    dates: &[chrono::NaiveDate],
    values: &[Option<f64>],
    window: usize,
    periods_per_year: f64,
) -> RollingSeries {
    let scale = periods_per_year.sqrt();
    RollingSeries {
        name: name.to_string(),
        statistic: RollingStatistic::Volatility(window),
        points: roll(dates, values, window, |w| Some(sample_stddev(w) * scale)),
    }
}
