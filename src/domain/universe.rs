//! Ticker universes: parsing ticker lists and resolving named presets.

use crate::domain::error::TickerListError;
use crate::ports::config_port::ConfigPort;
use std::collections::HashSet;

pub const PRESETS_SECTION: &str = "presets";

/// Parses a comma or whitespace separated ticker list.
///
/// Tickers are upper-cased and returned sorted. Empty input, duplicates and
/// characters outside `[A-Z0-9.^-]` are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, TickerListError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let ticker = token.to_uppercase();
        if !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
        {
            return Err(TickerListError::Invalid(token.to_string()));
        }
        if !seen.insert(ticker.clone()) {
            return Err(TickerListError::Duplicate(ticker));
        }
        tickers.push(ticker);
    }

    if tickers.is_empty() {
        return Err(TickerListError::Empty);
    }
    tickers.sort();
    Ok(tickers)
}

/// Preset names defined under `[presets]`.
pub fn preset_names(config: &dyn ConfigPort) -> Vec<String> {
    config.keys(PRESETS_SECTION)
}

pub fn resolve_preset(config: &dyn ConfigPort, name: &str) -> Result<Vec<String>, TickerListError> {
    let list = config
        .get_string(PRESETS_SECTION, &name.to_lowercase())
        .ok_or_else(|| TickerListError::UnknownPreset(name.to_string()))?;
    parse_tickers(&list)
}
