//! Core domain types and logic.

pub mod backtest;
pub mod batch;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod ledger;
pub mod lot;
pub mod metrics;
pub mod ohlcv;
pub mod signal;
pub mod simulator;
pub mod universe;
