//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for basketrisk.
#[derive(Debug, thiserror::Error)]
pub enum BasketError {
    #[error("insufficient data for {what}: have {have} observations, need {need}")]
    InsufficientData {
        what: String,
        have: usize,
        need: usize,
    },

    #[error("invalid price for {ticker} on {date}: {price}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("dates for {ticker} are not strictly increasing at {date}")]
    UnorderedDates { ticker: String, date: NaiveDate },

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("no constituents left to build an index from")]
    EmptyUniverse,

    #[error("empty input: {what}")]
    EmptyInput { what: String },

    #[error("correlation needs at least 2 series, got {count}")]
    InsufficientSeries { count: usize },

    #[error("window must be at least 2 observations, got {window}")]
    InvalidWindow { window: usize },

    #[error("data unavailable for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    TickerList(#[from] TickerListError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BasketError {
    pub fn insufficient(what: impl Into<String>, have: usize, need: usize) -> Self {
        BasketError::InsufficientData {
            what: what.into(),
            have,
            need,
        }
    }

    pub fn unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        BasketError::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing a ticker list.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickerListError {
    #[error("at least one ticker must be provided")]
    Empty,

    #[error("duplicate ticker: {0}")]
    Duplicate(String),

    #[error("invalid ticker {0:?}: only letters, digits, '.', '-' and '^' are allowed")]
    Invalid(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

impl From<&BasketError> for std::process::ExitCode {
    fn from(err: &BasketError) -> Self {
        let code: u8 = match err {
            BasketError::Io(_) => 1,
            BasketError::ConfigParse { .. }
            | BasketError::ConfigMissing { .. }
            | BasketError::ConfigInvalid { .. } => 2,
            BasketError::DataUnavailable { .. } => 3,
            BasketError::TickerList(_) | BasketError::DuplicateTicker(_) => 4,
            BasketError::InsufficientData { .. }
            | BasketError::EmptyUniverse
            | BasketError::EmptyInput { .. }
            | BasketError::InsufficientSeries { .. } => 5,
            BasketError::InvalidPrice { .. }
            | BasketError::UnorderedDates { .. }
            | BasketError::InvalidWindow { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
