//! Scanning loaded price histories and accounting for the pairs found.
//!
//! This module provides:
//! - Price series loading (CSV + JSON import)
//! - Per-pair and aggregate gain reporting
//! - Penalty sweeps over one series
//!
//! # Example
//!
//! ```rust,ignore
//! use optitrade::backtest::{load_series, scan_series};
//! use optitrade::finder::Penalty;
//!
//! let series = load_series("data/prices.csv", "close")?;
//! let result = scan_series(&series, Penalty::Symmetric(0.0025))?;
//! println!("{}", result.report.summary());
//! ```

mod data;
mod metrics;
mod runner;

pub use data::{load_series, CsvSeriesLoader, JsonSeriesLoader, PriceSeries, SeriesLoader};
pub use metrics::{PairOutcome, PairReport};
pub use runner::{PenaltySweep, SweepResults, SweepRun};

use crate::finder::{PairFinder, Penalty, ScanStats, TradePair};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Pairs, report and counters from scanning one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub pairs: Vec<TradePair>,
    pub report: PairReport,
    pub stats: ScanStats,
}

/// Scan a loaded series once under `penalty`.
pub fn scan_series(series: &PriceSeries, penalty: Penalty) -> Result<ScanResult> {
    let mut finder = PairFinder::new(series.values.as_slice(), penalty)
        .context("Failed to construct pair finder")?;
    let pairs = finder.run().to_vec();
    let report = PairReport::build(series, penalty, &pairs);

    Ok(ScanResult {
        pairs,
        report,
        stats: finder.stats().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_series_scenario_a() {
        let series = PriceSeries::new(vec![5.94, 5.89, 5.97, 6.0, 5.98, 6.07, 5.88, 5.98, 5.9]);
        let result = scan_series(&series, Penalty::Symmetric(0.0025)).unwrap();

        assert_eq!(result.pairs.first().map(TradePair::as_tuple), Some((1, 5)));
        assert_eq!(result.report.pair_count(), result.pairs.len());
        assert_eq!(result.stats.confirmed, result.pairs.len());
    }

    #[test]
    fn test_scan_series_short_input() {
        let series = PriceSeries::new(vec![1.0]);
        let result = scan_series(&series, Penalty::default()).unwrap();
        assert!(result.pairs.is_empty());
        assert!(result.report.outcomes.is_empty());
    }
}
