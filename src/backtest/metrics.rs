//! Gain accounting for registered pairs.
//!
//! Values stay `f64` through the scan; reported aggregates are converted to
//! `Decimal` so summaries and CSV output round predictably.

use crate::backtest::PriceSeries;
use crate::finder::{Penalty, TradePair};
use crate::utils::{from_percentage, round_to_precision, to_decimal, to_percentage};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of a single opt-in/opt-out pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOutcome {
    pub opt_in: usize,
    pub opt_out: usize,
    pub opt_in_time: Option<DateTime<Utc>>,
    pub opt_out_time: Option<DateTime<Utc>>,
    pub entry_value: f64,
    pub exit_value: f64,
    /// Exit minus entry, before penalties
    pub gross_gain: Decimal,
    /// `(1 - exit) * exit_value - (1 + entry) * entry_value`
    pub net_gain: Decimal,
    /// Net gain relative to the penalized entry cost, in percent
    pub return_pct: Decimal,
    pub holding_length: usize,
}

impl PairOutcome {
    fn new(series: &PriceSeries, penalty: &Penalty, pair: &TradePair) -> Self {
        let entry_value = series.values[pair.opt_in];
        let exit_value = series.values[pair.opt_out];
        let net = penalty.net_gain(entry_value, exit_value);
        let cost = (1.0 + penalty.entry()) * entry_value;
        let return_pct = if cost != 0.0 {
            to_percentage(to_decimal(net / cost))
        } else {
            Decimal::ZERO
        };

        Self {
            opt_in: pair.opt_in,
            opt_out: pair.opt_out,
            opt_in_time: series.timestamp(pair.opt_in),
            opt_out_time: series.timestamp(pair.opt_out),
            entry_value,
            exit_value,
            gross_gain: to_decimal(exit_value - entry_value),
            net_gain: to_decimal(net),
            return_pct,
            holding_length: pair.holding_length(),
        }
    }
}

/// Aggregate report over all registered pairs of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    pub penalty: Penalty,
    pub samples: usize,
    pub outcomes: Vec<PairOutcome>,
    /// Sum of per-pair net gains
    pub total_net_gain: Decimal,
    /// Sum of per-pair gross gains
    pub total_gross_gain: Decimal,
    /// Product of `1 + return` across pairs, minus one, in percent
    pub compounded_return_pct: Decimal,
    pub avg_holding_length: f64,
    /// Fraction of samples spent holding, in percent
    pub exposure_pct: Decimal,
}

impl PairReport {
    /// Evaluate `pairs` against the series they were found in.
    pub fn build(series: &PriceSeries, penalty: Penalty, pairs: &[TradePair]) -> Self {
        let outcomes: Vec<PairOutcome> = pairs
            .iter()
            .map(|pair| PairOutcome::new(series, &penalty, pair))
            .collect();

        let total_net_gain = outcomes.iter().map(|o| o.net_gain).sum();
        let total_gross_gain = outcomes.iter().map(|o| o.gross_gain).sum();

        let compounded = outcomes
            .iter()
            .fold(Decimal::ONE, |acc, o| acc * (Decimal::ONE + from_percentage(o.return_pct)));
        let compounded_return_pct = to_percentage(compounded - Decimal::ONE);

        let held: usize = outcomes.iter().map(|o| o.holding_length).sum();
        let avg_holding_length = if outcomes.is_empty() {
            0.0
        } else {
            held as f64 / outcomes.len() as f64
        };
        let exposure_pct = if series.len() > 1 {
            to_percentage(Decimal::from(held) / Decimal::from(series.len() - 1))
        } else {
            Decimal::ZERO
        };

        Self {
            penalty,
            samples: series.len(),
            outcomes,
            total_net_gain,
            total_gross_gain,
            compounded_return_pct,
            avg_holding_length,
            exposure_pct,
        }
    }

    pub fn pair_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Export pairs to CSV.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "opt_in,opt_out,opt_in_time,opt_out_time,entry_value,exit_value,net_gain,return_pct"
        )?;

        for o in &self.outcomes {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{}",
                o.opt_in,
                o.opt_out,
                o.opt_in_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                o.opt_out_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                o.entry_value,
                o.exit_value,
                round_to_precision(o.net_gain, 8),
                round_to_precision(o.return_pct, 4),
            )?;
        }

        Ok(())
    }

    /// Format the report as a summary string.
    pub fn summary(&self) -> String {
        let mut out = format!(
            r#"═══════════════════════════════════════════════
PAIR SCAN RESULTS ({} samples)
═══════════════════════════════════════════════
PENALTY
  Entry:             {:.4}%
  Exit:              {:.4}%

PAIRS
  Registered:        {}
  Avg Holding:       {:.1} samples
  Exposure:          {:.1}%

GAINS
  Gross Gain:        {:.6}
  Net Gain:          {:.6}
  Compounded Return: {:.4}%
═══════════════════════════════════════════════"#,
            self.samples,
            self.penalty.entry() * 100.0,
            self.penalty.exit() * 100.0,
            self.pair_count(),
            self.avg_holding_length,
            self.exposure_pct,
            self.total_gross_gain,
            self.total_net_gain,
            self.compounded_return_pct,
        );

        for o in &self.outcomes {
            out.push_str(&format!(
                "\n  [{:>5} -> {:>5}]  {:.4} -> {:.4}  net {:.6} ({:.3}%)",
                o.opt_in, o.opt_out, o.entry_value, o.exit_value, o.net_gain, o.return_pct
            ));
        }

        out
    }
}
