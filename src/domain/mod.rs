//! Core domain types and logic.

pub mod lifecycle;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod entry_filter;
pub mod sizing;
pub mod exit_resolver;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
