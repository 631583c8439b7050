//! # optitrade
//!
//! Finds penalty-aware opt-in/opt-out pairs in a single price series: enter
//! at a local low, exit at a later local high, and pay a transaction penalty
//! on both sides.
//!
//! ## Architecture
//!
//! - `finder`: Pair finder core (penalty model, scan primitives, greedy scan)
//! - `backtest`: Series loading, gain reporting and penalty sweeps
//! - `config`: Configuration management and validation
//! - `utils`: Shared utilities and decimal arithmetic

pub mod backtest;
pub mod config;
pub mod finder;
pub mod utils;

pub use crate::config::Config;
pub use finder::{find_optimal_pairs, FinderError, PairFinder, Penalty, TradePair};
