//! Date-keyed series with a display label, the common input of the report
//! adapters.

use crate::domain::drawdown::DrawdownSeries;
use crate::domain::price::PriceSeries;
use crate::domain::returns::ReturnSeries;
use crate::domain::rolling::RollingSeries;
use crate::domain::table::PriceTable;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl LabeledSeries {
    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().filter_map(|(d, v)| v.map(|v| (*d, v)))
    }

    pub fn has_values(&self) -> bool {
        self.defined().next().is_some()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn from_rolling(series: &RollingSeries) -> Self {
        Self {
            label: format!("{} {}", series.name, series.statistic),
            points: series.points.iter().map(|p| (p.date, p.value)).collect(),
        }
    }

    pub fn from_prices(series: &PriceSeries) -> Self {
        Self {
            label: series.ticker().to_string(),
            points: series.points().iter().map(|p| (p.date, Some(p.value))).collect(),
        }
    }

    pub fn from_returns(series: &ReturnSeries) -> Self {
        Self {
            label: series.name.clone(),
            points: series.points.iter().map(|p| (p.date, Some(p.value))).collect(),
        }
    }

    pub fn from_drawdown(series: &DrawdownSeries) -> Self {
        Self {
            label: series.name.clone(),
            points: series.points.iter().map(|p| (p.date, Some(p.drawdown))).collect(),
        }
    }

    /// One series per table column.
    pub fn from_table(table: &PriceTable) -> Vec<Self> {
        table
            .columns()
            .map(|(ticker, column)| Self {
                label: ticker.to_string(),
                points: table.dates().iter().copied().zip(column.iter().copied()).collect(),
            })
            .collect()
    }
}

/// Joins series on the union of their dates, one row per date.
pub fn outer_join(series: &[LabeledSeries]) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (i, s) in series.iter().enumerate() {
        for &(date, value) in &s.points {
            rows.entry(date).or_insert_with(|| vec![None; series.len()])[i] = value;
        }
    }
    rows.into_iter().collect()
}
