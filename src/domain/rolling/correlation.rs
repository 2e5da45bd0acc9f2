//! Pearson correlation: rolling cross-sectional average and full-sample matrix.
//!
//! AVG_CORRELATION(w)[i] is the mean of the pairwise correlations of all
//! columns over r[i-w+1..=i], taken over the upper triangle of the matrix
//! (each pair once, diagonal excluded). A pair is left out of a window when
//! either side has a missing return or zero variance there; a window with no
//! usable pair is undefined.

use crate::domain::error::BasketError;
use crate::domain::returns::ReturnTable;
use crate::domain::rolling::{RollingPoint, RollingSeries, RollingStatistic, check_window, mean};

pub const AVERAGE_CORRELATION: &str = "average_correlation";

/// Pearson correlation of two equal-length samples, `None` when either has
/// zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    if x.iter().all(|&v| v == x[0]) || y.iter().all(|&v| v == y[0]) {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

/// Correlation over the rows where both columns are observed.
fn pairwise_complete(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    pearson(&x, &y)
}

pub fn rolling_average_correlation(
    returns: &ReturnTable,
    window: usize,
) -> Result<RollingSeries, BasketError> {
    if returns.width() < 2 {
        return Err(BasketError::InsufficientSeries {
            count: returns.width(),
        });
    }
    check_window("average correlation", returns.len(), window)?;

    let columns: Vec<&[Option<f64>]> = returns.columns().map(|(_, c)| c).collect();
    let points = returns
        .dates()
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let value = if i + 1 < window {
                None
            } else {
                let start = i + 1 - window;
                let windows: Vec<Option<Vec<f64>>> = columns
                    .iter()
                    .map(|c| c[start..=i].iter().copied().collect::<Option<Vec<f64>>>())
                    .collect();

                let mut sum = 0.0;
                let mut pairs = 0usize;
                for a in 0..windows.len() {
                    for b in a + 1..windows.len() {
                        if let (Some(x), Some(y)) = (&windows[a], &windows[b]) {
                            if let Some(rho) = pearson(x, y) {
                                sum += rho;
                                pairs += 1;
                            }
                        }
                    }
                }
                (pairs > 0).then(|| sum / pairs as f64)
            };
            RollingPoint { date, value }
        })
        .collect();

    Ok(RollingSeries {
        name: AVERAGE_CORRELATION.to_string(),
        statistic: RollingStatistic::AverageCorrelation(window),
        points,
    })
}

/// Full-sample correlation matrix over pairwise-complete observations.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.values[i][j]
    }

    /// Mean of the defined upper-triangle entries.
    pub fn average_off_diagonal(&self) -> Option<f64> {
        let upper: Vec<f64> = (0..self.tickers.len())
            .flat_map(|i| (i + 1..self.tickers.len()).filter_map(move |j| self.values[i][j]))
            .collect();
        (!upper.is_empty()).then(|| mean(&upper))
    }
}

pub fn correlation_matrix(returns: &ReturnTable) -> Result<CorrelationMatrix, BasketError> {
    if returns.width() < 2 {
        return Err(BasketError::InsufficientSeries {
            count: returns.width(),
        });
    }
    let columns: Vec<&[Option<f64>]> = returns.columns().map(|(_, c)| c).collect();
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let rho = if i == j {
                // A column correlates perfectly with itself only if it varies.
                pairwise_complete(columns[i], columns[i]).map(|_| 1.0)
            } else {
                pairwise_complete(columns[i], columns[j])
            };
            values[i][j] = rho;
            values[j][i] = rho;
        }
    }
    Ok(CorrelationMatrix {
        tickers: returns.tickers().to_vec(),
        values,
    })
}
