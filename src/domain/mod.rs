//! Core domain types and indicator computations.

pub mod analysis;
pub mod config_validation;
pub mod drawdown;
pub mod error;
pub mod index;
pub mod price;
pub mod returns;
pub mod rolling;
pub mod table;
pub mod universe;
