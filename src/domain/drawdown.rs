//! Running peak, drawdown curve and maximum drawdown.
//!
//! peak[t]     = max(level[0..=t])
//! drawdown[t] = level[t] / peak[t] - 1        (always <= 0)

use crate::domain::error::BasketError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub peak: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownSeries {
    pub name: String,
    pub points: Vec<DrawdownPoint>,
}

impl DrawdownSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The deepest decline and the dates that bracket it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxDrawdown {
    /// Most negative drawdown, e.g. -0.25 for a 25% decline. 0 if the
    /// series never fell below a prior peak.
    pub depth: f64,
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    /// First date at or after the trough where the level regained the peak.
    pub recovery_date: Option<NaiveDate>,
    /// Observations from the peak to recovery, or to the end of the series
    /// if still underwater. 0 when there was no drawdown.
    pub duration: usize,
}

pub fn calculate_drawdown(levels: &PriceSeries) -> Result<DrawdownSeries, BasketError> {
    if levels.is_empty() {
        return Err(BasketError::EmptyInput {
            what: format!("drawdown of {}", levels.ticker()),
        });
    }
    levels.ensure_positive()?;

    let mut peak = f64::NEG_INFINITY;
    let points = levels
        .points()
        .iter()
        .map(|p| {
            if p.value > peak {
                peak = p.value;
            }
            DrawdownPoint {
                date: p.date,
                peak,
                drawdown: p.value / peak - 1.0,
            }
        })
        .collect();

    Ok(DrawdownSeries {
        name: levels.ticker().to_string(),
        points,
    })
}

pub fn max_drawdown(levels: &PriceSeries) -> Result<MaxDrawdown, BasketError> {
    let series = calculate_drawdown(levels)?;
    let points = levels.points();

    let mut peak_idx = 0usize;
    let mut best = (0usize, 0usize, 0.0_f64);
    for (i, dd) in series.points.iter().enumerate() {
        if dd.drawdown == 0.0 && points[i].value >= points[peak_idx].value {
            peak_idx = i;
        }
        if dd.drawdown < best.2 {
            best = (peak_idx, i, dd.drawdown);
        }
    }

    let (peak_i, trough_i, depth) = best;
    if depth == 0.0 {
        return Ok(MaxDrawdown {
            depth,
            peak_date: points[peak_i].date,
            trough_date: points[trough_i].date,
            recovery_date: None,
            duration: 0,
        });
    }

    let peak_value = points[peak_i].value;
    let recovery_i = (trough_i + 1..points.len()).find(|&i| points[i].value >= peak_value);
    let duration = recovery_i.unwrap_or(points.len() - 1) - peak_i;

    Ok(MaxDrawdown {
        depth,
        peak_date: points[peak_i].date,
        trough_date: points[trough_i].date,
        recovery_date: recovery_i.map(|i| points[i].date),
        duration,
    })
}
