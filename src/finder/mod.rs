//! Opt-in/opt-out pair finder.
//!
//! This module provides:
//! - Penalty model (symmetric or entry/exit asymmetric)
//! - Forward-scan primitives (extremum search, next exceeding, range minimum)
//! - The greedy scan that registers net-positive pairs
//!
//! # Example
//!
//! ```rust
//! use optitrade::finder::{PairFinder, Penalty};
//!
//! let series = vec![5.94, 5.89, 5.97, 6.0, 5.98, 6.07, 5.88, 5.98, 5.9];
//! let mut finder = PairFinder::new(series, Penalty::Symmetric(0.0025))?;
//! let pairs = finder.run();
//! assert_eq!(pairs[0].as_tuple(), (1, 5));
//! # Ok::<(), optitrade::finder::FinderError>(())
//! ```

mod error;
mod pair_finder;
mod penalty;
mod scan;

pub use error::{FinderError, Result};
pub use pair_finder::{find_optimal_pairs, PairFinder, ScanStats, TradePair};
pub use penalty::Penalty;
pub use scan::{
    find_extreme, find_min_in_range, find_next_exceeding, is_net_positive, is_split_profitable,
    Extreme,
};
