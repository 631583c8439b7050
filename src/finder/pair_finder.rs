//! Greedy opt-in/opt-out traversal over a single series.

use super::error::{FinderError, Result};
use super::penalty::Penalty;
use super::scan::{
    find_extreme, find_min_in_range, find_next_exceeding, is_net_positive, is_split_profitable,
    Extreme,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

/// A confirmed entry/exit pair of series indices, `opt_in < opt_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradePair {
    pub opt_in: usize,
    pub opt_out: usize,
}

impl TradePair {
    pub fn new(opt_in: usize, opt_out: usize) -> Self {
        Self { opt_in, opt_out }
    }

    /// `(opt_in, opt_out)`
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.opt_in, self.opt_out)
    }

    /// Number of samples between entry and exit.
    pub fn holding_length(&self) -> usize {
        self.opt_out - self.opt_in
    }
}

impl From<TradePair> for (usize, usize) {
    fn from(pair: TradePair) -> Self {
        pair.as_tuple()
    }
}

/// The in-progress, unconfirmed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Empty,
    PendingEntry(usize),
    PendingPair { entry: usize, decision: usize },
}

impl Candidate {
    fn entry(self) -> usize {
        match self {
            Self::PendingEntry(entry) | Self::PendingPair { entry, .. } => entry,
            Self::Empty => unreachable!("candidate has no entry"),
        }
    }

    fn with_decision(self, decision: usize) -> Self {
        match self {
            Self::PendingEntry(entry) => Self::PendingPair { entry, decision },
            other => unreachable!("decision point pushed onto {other:?}"),
        }
    }

    fn without_decision(self) -> Self {
        match self {
            Self::PendingPair { entry, .. } => Self::PendingEntry(entry),
            other => unreachable!("no decision point to drop from {other:?}"),
        }
    }

    fn pair(self) -> TradePair {
        match self {
            Self::PendingPair { entry, decision } => TradePair::new(entry, decision),
            other => unreachable!("incomplete candidate {other:?}"),
        }
    }
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Opt-in searches started
    pub outer_passes: usize,
    /// Decision points evaluated
    pub inner_iterations: usize,
    /// Pairs appended to the registry
    pub confirmed: usize,
    /// Completed pairs dropped for not clearing the penalty
    pub discarded: usize,
    /// Opt-ins replaced by a later dip
    pub refinements: usize,
    /// Dips held through in favour of a higher exit
    pub holds: usize,
    /// Cursor moves that went backwards
    pub backward_moves: usize,
}

/// Scans a series for penalty-aware opt-in/opt-out pairs.
///
/// Each call to [`run`](Self::run) starts from a clean state, so the same
/// finder can be run repeatedly and always yields the same pairs.
#[derive(Debug, Clone)]
pub struct PairFinder {
    series: Vec<f64>,
    penalty: Penalty,
    cursor: usize,
    candidate: Candidate,
    pairs: Vec<TradePair>,
    stats: ScanStats,
}

impl PairFinder {
    /// Create a finder over `series`. Every sample and both penalty sides must be finite.
    pub fn new(series: impl Into<Vec<f64>>, penalty: Penalty) -> Result<Self> {
        penalty.validate()?;
        let series = series.into();
        if let Some((index, &value)) = series.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(FinderError::NonFiniteSample { index, value });
        }

        Ok(Self {
            series,
            penalty,
            cursor: 0,
            candidate: Candidate::Empty,
            pairs: Vec::new(),
            stats: ScanStats::default(),
        })
    }

    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    /// Pairs registered by the last run.
    pub fn pairs(&self) -> &[TradePair] {
        &self.pairs
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn into_pairs(self) -> Vec<TradePair> {
        self.pairs
    }

    /// Net gain of a pair under this finder's penalty.
    pub fn net_gain(&self, pair: &TradePair) -> f64 {
        self.penalty
            .net_gain(self.series[pair.opt_in], self.series[pair.opt_out])
    }

    /// Clear cursor, candidate, registry and counters.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.candidate = Candidate::Empty;
        self.pairs.clear();
        self.stats = ScanStats::default();
    }

    /// Scan the whole series and return the registered pairs.
    #[instrument(skip(self), fields(samples = self.series.len()))]
    pub fn run(&mut self) -> &[TradePair] {
        self.reset();
        let last = self.series.len().saturating_sub(1);

        while self.cursor < last {
            self.stats.outer_passes += 1;

            let opt_in = find_extreme(&self.series, self.cursor, Extreme::Minimum);
            self.move_cursor(opt_in);
            self.candidate = Candidate::PendingEntry(opt_in);

            while self.cursor < last {
                self.stats.inner_iterations += 1;

                let decision = find_extreme(&self.series, self.cursor, Extreme::Maximum);
                self.move_cursor(decision);
                self.candidate = self.candidate.with_decision(decision);

                // Current peak is the maximum of everything left
                let Some(next) = find_next_exceeding(&self.series, decision) else {
                    if is_net_positive(&self.series, &self.penalty, self.candidate.entry(), decision)
                    {
                        self.confirm();
                    } else {
                        self.discard();
                    }
                    break;
                };

                let intermediate = find_min_in_range(&self.series, decision, Some(next));
                let profitable = is_split_profitable(
                    &self.series,
                    &self.penalty,
                    decision,
                    self.series[intermediate],
                );
                let confirmable =
                    is_net_positive(&self.series, &self.penalty, self.candidate.entry(), decision);

                if profitable && confirmable {
                    self.confirm();
                    break;
                } else if profitable {
                    let refined = find_extreme(&self.series, self.cursor, Extreme::Minimum);
                    debug!(
                        previous = self.candidate.entry(),
                        refined, decision, "Refining opt-in to later dip"
                    );
                    self.move_cursor(refined);
                    self.candidate = Candidate::PendingEntry(refined);
                    self.stats.refinements += 1;
                } else {
                    trace!(decision, next, intermediate, "Holding through dip");
                    self.move_cursor(next);
                    self.candidate = self.candidate.without_decision();
                    self.stats.holds += 1;
                }
            }
        }

        // Drop an unclosed opt-in
        self.candidate = Candidate::Empty;

        info!(
            pairs = self.pairs.len(),
            discarded = self.stats.discarded,
            refinements = self.stats.refinements,
            "Scan complete"
        );

        &self.pairs
    }

    fn move_cursor(&mut self, to: usize) {
        if to < self.cursor {
            self.stats.backward_moves += 1;
        }
        trace!(from = self.cursor, to, "Cursor moved");
        self.cursor = to;
    }

    fn confirm(&mut self) {
        let pair = self.candidate.pair();
        debug_assert!(pair.opt_in < pair.opt_out);
        debug!(
            opt_in = pair.opt_in,
            opt_out = pair.opt_out,
            net_gain = self.net_gain(&pair),
            "Registered pair"
        );
        self.pairs.push(pair);
        self.stats.confirmed += 1;
        self.candidate = Candidate::Empty;
    }

    fn discard(&mut self) {
        let pair = self.candidate.pair();
        debug!(
            opt_in = pair.opt_in,
            opt_out = pair.opt_out,
            net_gain = self.net_gain(&pair),
            "Discarded unprofitable pair"
        );
        self.stats.discarded += 1;
        self.candidate = Candidate::Empty;
    }
}

/// Run a one-off scan over `series`.
pub fn find_optimal_pairs(series: &[f64], penalty: Penalty) -> Result<Vec<TradePair>> {
    let mut finder = PairFinder::new(series, penalty)?;
    finder.run();
    Ok(finder.into_pairs())
}
