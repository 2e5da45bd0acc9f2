//! Market-data access port.

use crate::domain::error::BasketError;
use crate::domain::price::PriceSeries;
use crate::domain::table::PriceTable;
use chrono::NaiveDate;
use tracing::{info, warn};

pub trait PriceDataPort {
    /// Prices of one ticker within `[start_date, end_date]`, ordered by date.
    /// An unknown ticker or unreachable source is `DataUnavailable`.
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, BasketError>;

    fn list_tickers(&self) -> Result<Vec<String>, BasketError>;

    /// First date, last date and observation count, if the ticker has data.
    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BasketError>;

    /// Fetches every ticker and aligns them into one table. The first
    /// failure is returned as is; no ticker is substituted or skipped.
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceTable, BasketError> {
        if tickers.is_empty() {
            return Err(BasketError::EmptyInput {
                what: "no tickers requested".into(),
            });
        }

        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let s = self.fetch_series(ticker, start_date, end_date)?;
            if s.is_empty() {
                warn!(%ticker, %start_date, %end_date, "no prices in requested range");
            }
            series.push(s);
        }

        let table = PriceTable::align(&series)?;
        info!(
            tickers = table.width(),
            rows = table.len(),
            missing = table.missing_count(),
            "fetched price table"
        );
        Ok(table)
    }
}
