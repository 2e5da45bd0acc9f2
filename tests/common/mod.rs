#![allow(dead_code)]

use basketrisk::domain::error::BasketError;
use basketrisk::domain::price::{Observation, PriceSeries};
use basketrisk::ports::data_port::PriceDataPort;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<Observation>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, points: Vec<Observation>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    /// Prices on consecutive weekdays starting at `start`.
    pub fn with_closes(self, ticker: &str, start: NaiveDate, closes: &[f64]) -> Self {
        let points = trading_days(start, closes.len())
            .into_iter()
            .zip(closes)
            .map(|(date, &close)| Observation::new(date, close))
            .collect();
        self.with_prices(ticker, points)
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BasketError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(BasketError::unavailable(ticker, reason.clone()));
        }
        let points = self
            .data
            .get(ticker)
            .ok_or_else(|| BasketError::unavailable(ticker, "unknown ticker"))?
            .iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .copied()
            .collect();
        PriceSeries::new(ticker, points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, BasketError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BasketError> {
        Ok(self.data.get(ticker).and_then(|points| {
            Some((points.first()?.date, points.last()?.date, points.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` weekdays from `start` (inclusive when it is a weekday).
pub fn trading_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut day = start;
    while days.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

/// Deterministic wavy price path, always positive.
pub fn synthetic_closes(n: usize, phase: f64, drift: f64) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let t = t as f64;
            100.0 * (1.0 + drift * t) * (1.0 + 0.05 * (0.3 * t + phase).sin())
        })
        .collect()
}

/// Writes `<ticker>.csv` with `date,close` rows on consecutive weekdays.
pub fn write_price_csv(dir: &Path, ticker: &str, start: NaiveDate, closes: &[f64]) {
    let mut content = String::from("date,close\n");
    for (day, close) in trading_days(start, closes.len()).into_iter().zip(closes) {
        content.push_str(&format!("{},{}\n", day, close));
    }
    fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}
