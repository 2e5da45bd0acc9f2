//! basketrisk: risk and return indicators for equal-weight ticker baskets.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and the command-line layer in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
