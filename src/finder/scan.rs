//! Forward-scan primitives over a price series.
//!
//! Every function takes the series and a cursor and returns an index; none of
//! them hold state or read past the last sample.

use super::penalty::Penalty;

/// Which kind of local extremum a forward search is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    /// Keep walking while the next sample is not higher
    Minimum,
    /// Keep walking while the next sample is not lower
    Maximum,
}

/// Walk forward from `cursor` until the next sample would reverse direction.
///
/// Returns `cursor` unchanged when it already sits on the last sample or the
/// very next sample reverses.
pub fn find_extreme(series: &[f64], cursor: usize, extreme: Extreme) -> usize {
    let mut pos = cursor;
    while pos + 1 < series.len() {
        let continues = match extreme {
            Extreme::Minimum => series[pos + 1] <= series[pos],
            Extreme::Maximum => series[pos + 1] >= series[pos],
        };
        if !continues {
            break;
        }
        pos += 1;
    }
    pos
}

/// First index after `index` whose sample is strictly greater than `series[index]`.
///
/// `None` means `series[index]` is the maximum of the remaining series.
pub fn find_next_exceeding(series: &[f64], index: usize) -> Option<usize> {
    let threshold = *series.get(index)?;
    series
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|&(_, &value)| value > threshold)
        .map(|(i, _)| i)
}

/// Index of the smallest sample in `[start, end)`, or `[start, len)` when `end` is `None`.
///
/// Ties resolve to the earliest index. An empty range returns `start`.
pub fn find_min_in_range(series: &[f64], start: usize, end: Option<usize>) -> usize {
    let end = end.unwrap_or(series.len()).min(series.len());
    if start >= end {
        return start;
    }

    let mut best = start;
    for (offset, &value) in series[start..end].iter().enumerate() {
        if value < series[best] {
            best = start + offset;
        }
    }
    best
}

/// Whether buying at `entry` and selling at `exit` clears both penalties.
pub fn is_net_positive(series: &[f64], penalty: &Penalty, entry: usize, exit: usize) -> bool {
    penalty.net_gain(series[entry], series[exit]) > 0.0
}

/// Whether selling at `current` and buying back at `intermediate_value` beats
/// holding through the dip.
pub fn is_split_profitable(
    series: &[f64],
    penalty: &Penalty,
    current: usize,
    intermediate_value: f64,
) -> bool {
    penalty.split_gain(series[current], intermediate_value) > 0.0
}
