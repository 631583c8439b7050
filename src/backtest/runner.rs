//! Penalty sweep over a single series.
//!
//! Each penalty gets its own independent `PairFinder`; runs share nothing but
//! the read-only series and execute on a bounded rayon pool.

use crate::backtest::{scan_series, PairReport, PriceSeries};
use crate::finder::{Penalty, ScanStats};
use crate::utils::round_to_precision;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// One penalty's outcome in a sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRun {
    pub penalty: Penalty,
    pub report: PairReport,
    pub stats: ScanStats,
}

/// Results from a penalty sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResults {
    /// Runs in the order the penalties were given
    pub runs: Vec<SweepRun>,

    /// Index of the run with the highest total net gain
    pub best_by_net_gain: Option<usize>,
}

impl SweepResults {
    fn new(runs: Vec<SweepRun>) -> Self {
        let best_by_net_gain = runs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.report.total_net_gain.cmp(&b.report.total_net_gain))
            .map(|(i, _)| i);

        Self {
            runs,
            best_by_net_gain,
        }
    }

    /// Get the best run by total net gain.
    pub fn best(&self) -> Option<&SweepRun> {
        self.best_by_net_gain.map(|i| &self.runs[i])
    }

    /// Highest total net gain across the sweep, or zero when empty.
    pub fn best_net_gain(&self) -> Decimal {
        self.best()
            .map(|run| run.report.total_net_gain)
            .unwrap_or(Decimal::ZERO)
    }

    /// Export results to CSV.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;

        writeln!(
            file,
            "entry_penalty,exit_penalty,pairs,total_net_gain,compounded_return_pct,exposure_pct"
        )?;

        for run in &self.runs {
            writeln!(
                file,
                "{},{},{},{},{},{}",
                run.penalty.entry(),
                run.penalty.exit(),
                run.report.pair_count(),
                round_to_precision(run.report.total_net_gain, 8),
                round_to_precision(run.report.compounded_return_pct, 4),
                round_to_precision(run.report.exposure_pct, 2),
            )?;
        }

        Ok(())
    }

    /// Generate a summary comparison table.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str("PENALTY SWEEP RESULTS\n");
        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str("  Entry %   Exit %   Pairs     Net Gain    Compounded %\n");

        for run in &self.runs {
            s.push_str(&format!(
                "  {:>7.4}  {:>7.4}  {:>5}  {:>11.6}  {:>14.4}\n",
                run.penalty.entry() * 100.0,
                run.penalty.exit() * 100.0,
                run.report.pair_count(),
                run.report.total_net_gain,
                run.report.compounded_return_pct,
            ));
        }

        if let Some(best) = self.best() {
            s.push_str(&format!(
                "\nBEST BY NET GAIN: entry {:.4}% / exit {:.4}% ({} pairs, net {:.6})\n",
                best.penalty.entry() * 100.0,
                best.penalty.exit() * 100.0,
                best.report.pair_count(),
                best.report.total_net_gain,
            ));
        }

        s.push_str("═══════════════════════════════════════════════════════════════\n");

        s
    }
}

/// Runs one scan per penalty over the same series.
pub struct PenaltySweep {
    penalties: Vec<Penalty>,
    parallelism: usize,
}

impl PenaltySweep {
    /// Create a new sweep.
    pub fn new(penalties: Vec<Penalty>, parallelism: usize) -> Self {
        Self {
            penalties,
            parallelism: parallelism.max(1),
        }
    }

    /// Run the sweep.
    pub fn run(&self, series: &PriceSeries) -> Result<SweepResults> {
        info!(
            "Starting penalty sweep with {} penalties, parallelism={}",
            self.penalties.len(),
            self.parallelism
        );

        if self.penalties.is_empty() {
            warn!("Penalty sweep has no penalties to test");
            return Ok(SweepResults::new(Vec::new()));
        }

        let total = self.penalties.len();
        let completed = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .context("Failed to create sweep thread pool")?;

        let runs = pool.install(|| {
            self.penalties
                .par_iter()
                .map(|&penalty| -> Result<SweepRun> {
                    let run = run_one(series, penalty)?;
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(
                        "[{}/{}] entry={:.4}% exit={:.4}% pairs={} net={:.6}",
                        done,
                        total,
                        penalty.entry() * 100.0,
                        penalty.exit() * 100.0,
                        run.report.pair_count(),
                        run.report.total_net_gain,
                    );
                    Ok(run)
                })
                .collect::<Result<Vec<SweepRun>>>()
        })?;

        let results = SweepResults::new(runs);
        if let Some(best) = results.best() {
            info!(
                "Sweep complete: best entry={:.4}% exit={:.4}% net={}",
                best.penalty.entry() * 100.0,
                best.penalty.exit() * 100.0,
                round_to_precision(best.report.total_net_gain, 6),
            );
        }

        Ok(results)
    }
}

fn run_one(series: &PriceSeries, penalty: Penalty) -> Result<SweepRun> {
    let result = scan_series(series, penalty)?;

    Ok(SweepRun {
        penalty,
        report: result.report,
        stats: result.stats,
    })
}
