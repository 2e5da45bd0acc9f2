//! End-to-end analysis of a ticker basket.
//!
//! Loads prices through a [`PriceDataPort`], resolves gaps, derives returns,
//! builds the equal-weight index and computes every rolling and drawdown
//! statistic in one pass. All tunables come from [`AnalysisConfig`].

use crate::domain::drawdown::{DrawdownSeries, MaxDrawdown, calculate_drawdown, max_drawdown};
use crate::domain::error::BasketError;
use crate::domain::index::{IndexMethod, equal_weight_prices, equal_weight_returns};
use crate::domain::price::PriceSeries;
use crate::domain::returns::{
    ReturnMode, ReturnSeries, ReturnTable, calculate_returns, calculate_table_returns, compound,
};
use crate::domain::rolling::{
    CorrelationMatrix, RollingSeries, correlation_matrix, rolling_average_correlation,
    rolling_sharpe, rolling_sharpe_table, rolling_volatility, rolling_volatility_table,
};
use crate::domain::table::{Frequency, MissingDataPolicy, PriceTable};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use tracing::{info, warn};

pub const DEFAULT_WINDOW: usize = 60;
pub const DEFAULT_INDEX_BASE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub tickers: Vec<String>,
    pub benchmark: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub window: usize,
    pub periods_per_year: f64,
    /// Annual rate.
    pub risk_free_rate: f64,
    pub return_mode: ReturnMode,
    pub missing_policy: MissingDataPolicy,
    pub index_method: IndexMethod,
    pub index_base: f64,
    pub frequency: Frequency,
}

impl AnalysisConfig {
    /// Daily analysis with a 60-period window and no risk-free rate.
    pub fn new(tickers: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            tickers,
            benchmark: None,
            start_date,
            end_date,
            window: DEFAULT_WINDOW,
            periods_per_year: Frequency::Daily.periods_per_year(),
            risk_free_rate: 0.0,
            return_mode: ReturnMode::Simple,
            missing_policy: MissingDataPolicy::ForwardFill,
            index_method: IndexMethod::ReturnLevel,
            index_base: DEFAULT_INDEX_BASE,
            frequency: Frequency::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRow {
    pub name: String,
    pub start_price: f64,
    pub end_price: f64,
    pub total_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownReport {
    pub series: DrawdownSeries,
    pub max: MaxDrawdown,
}

impl DrawdownReport {
    fn of(levels: &PriceSeries) -> Result<Self, BasketError> {
        Ok(Self {
            series: calculate_drawdown(levels)?,
            max: max_drawdown(levels)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    /// Constituents that survived loading, in config order.
    pub constituents: Vec<String>,
    /// Constituent and benchmark prices after resampling and gap resolution.
    pub prices: PriceTable,
    /// `prices` rebased to the index base.
    pub normalized: PriceTable,
    pub returns: ReturnTable,
    pub index_levels: PriceSeries,
    pub index_returns: ReturnSeries,
    pub benchmark_levels: Option<PriceSeries>,
    pub benchmark_returns: Option<ReturnSeries>,
    /// Per constituent, then the index, then the benchmark.
    pub volatility: Vec<RollingSeries>,
    pub sharpe: Vec<RollingSeries>,
    pub average_correlation: Option<RollingSeries>,
    pub correlation_matrix: Option<CorrelationMatrix>,
    pub index_drawdown: DrawdownReport,
    pub benchmark_drawdown: Option<DrawdownReport>,
    /// Sorted by total return, best first.
    pub performance: Vec<PerformanceRow>,
}

pub fn run_analysis(
    data_port: &dyn PriceDataPort,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, BasketError> {
    if config.tickers.is_empty() {
        return Err(BasketError::EmptyUniverse);
    }

    let benchmark = config
        .benchmark
        .clone()
        .filter(|b| !config.tickers.contains(b));
    let mut requested = config.tickers.clone();
    requested.extend(benchmark.iter().cloned());

    let raw = data_port.fetch_prices(&requested, config.start_date, config.end_date)?;
    let prices = raw
        .drop_empty_columns()
        .resample(config.frequency)
        .resolve(config.missing_policy);

    let constituents: Vec<String> = config
        .tickers
        .iter()
        .filter(|t| {
            let present = prices.column(t).is_some();
            if !present {
                warn!(ticker = %t, "no prices in range, dropped from analysis");
            }
            present
        })
        .cloned()
        .collect();
    if constituents.is_empty() {
        return Err(BasketError::EmptyUniverse);
    }
    let benchmark = benchmark.filter(|b| {
        let present = prices.column(b).is_some();
        if !present {
            warn!(benchmark = %b, "no benchmark prices in range, benchmark skipped");
        }
        present
    });
    info!(
        constituents = constituents.len(),
        rows = prices.len(),
        policy = %config.missing_policy,
        "prepared price table"
    );

    let basket = prices.select(&constituents)?;
    let returns = calculate_table_returns(&basket, config.return_mode)?;

    let (index_levels, index_returns) = match config.index_method {
        IndexMethod::ReturnLevel => {
            let index_returns = equal_weight_returns(&returns, &constituents)?;
            let levels = compound(&index_returns, prices.dates()[0], config.index_base)?;
            (levels, index_returns)
        }
        IndexMethod::PriceLevel => {
            let levels = equal_weight_prices(&basket, &constituents, config.index_base)?;
            let index_returns = calculate_returns(&levels, config.return_mode)?;
            (levels, index_returns)
        }
    };

    let (benchmark_levels, benchmark_returns) = match &benchmark {
        Some(b) => {
            let raw = prices.series(b)?;
            let rebased = prices
                .select(std::slice::from_ref(b))?
                .rebased(config.index_base)?
                .series(b)?;
            (Some(rebased), Some(calculate_returns(&raw, config.return_mode)?))
        }
        None => (None, None),
    };

    let ppy = config.periods_per_year;
    let mut volatility = rolling_volatility_table(&returns, config.window, ppy)?;
    volatility.push(rolling_volatility(&index_returns, config.window, ppy)?);
    let mut sharpe = rolling_sharpe_table(&returns, config.window, ppy, config.risk_free_rate)?;
    sharpe.push(rolling_sharpe(
        &index_returns,
        config.window,
        ppy,
        config.risk_free_rate,
    )?);
    if let Some(r) = &benchmark_returns {
        volatility.push(rolling_volatility(r, config.window, ppy)?);
        sharpe.push(rolling_sharpe(r, config.window, ppy, config.risk_free_rate)?);
    }

    let (average_correlation, correlation_matrix) = if returns.width() >= 2 {
        (
            Some(rolling_average_correlation(&returns, config.window)?),
            Some(correlation_matrix(&returns)?),
        )
    } else {
        warn!("single constituent, correlation skipped");
        (None, None)
    };

    let index_drawdown = DrawdownReport::of(&index_levels)?;
    let benchmark_drawdown = benchmark_levels.as_ref().map(DrawdownReport::of).transpose()?;

    let mut performance = Vec::with_capacity(prices.width() + 1);
    for (ticker, _) in prices.columns() {
        performance.push(performance_row(&prices.series(ticker)?));
    }
    performance.push(performance_row(&index_levels));
    let mut performance: Vec<PerformanceRow> = performance.into_iter().flatten().collect();
    performance.sort_by(|a, b| b.total_return.total_cmp(&a.total_return));

    let normalized = prices.rebased(config.index_base)?;

    info!(
        index_points = index_levels.len(),
        max_drawdown = index_drawdown.max.depth,
        "analysis complete"
    );

    Ok(AnalysisReport {
        config: config.clone(),
        constituents,
        prices,
        normalized,
        returns,
        index_levels,
        index_returns,
        benchmark_levels,
        benchmark_returns,
        volatility,
        sharpe,
        average_correlation,
        correlation_matrix,
        index_drawdown,
        benchmark_drawdown,
        performance,
    })
}

fn performance_row(series: &PriceSeries) -> Option<PerformanceRow> {
    let first = series.first()?;
    let last = series.last()?;
    Some(PerformanceRow {
        name: series.ticker().to_string(),
        start_price: first.value,
        end_price: last.value,
        total_return: series.total_return()?,
    })
}
