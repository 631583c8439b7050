//! End-to-end scenarios through the public API.

use optitrade::backtest::{scan_series, CsvSeriesLoader, PriceSeries, SeriesLoader};
use optitrade::find_optimal_pairs;
use optitrade::finder::{is_net_positive, FinderError, PairFinder, Penalty, TradePair};

const SCENARIO_A: [f64; 9] = [5.94, 5.89, 5.97, 6.0, 5.98, 6.07, 5.88, 5.98, 5.9];

fn tuples(pairs: &[TradePair]) -> Vec<(usize, usize)> {
    pairs.iter().map(TradePair::as_tuple).collect()
}

#[test]
fn scenario_a_enters_at_dip_and_exits_at_peak() {
    let p = 0.0025;
    let pairs = find_optimal_pairs(&SCENARIO_A, Penalty::Symmetric(p)).unwrap();

    assert_eq!(pairs[0].as_tuple(), (1, 5));
    assert!((1.0 - p) * 6.07 - (1.0 + p) * 5.89 > 0.0);
    assert_eq!(tuples(&pairs), vec![(1, 5), (6, 7)]);
}

#[test]
fn scenario_b_monotonic_increase() {
    let series: Vec<f64> = (0..25).map(|i| 50.0 + 0.5 * i as f64).collect();

    let pairs = find_optimal_pairs(&series, Penalty::Symmetric(0.001)).unwrap();
    assert_eq!(tuples(&pairs), vec![(0, 24)]);

    // Rise of 24% cannot pay 20% on each side
    let pairs = find_optimal_pairs(&series, Penalty::Symmetric(0.2)).unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn scenario_c_monotonic_decrease() {
    let series: Vec<f64> = (0..25).map(|i| 50.0 - 0.5 * i as f64).collect();
    let pairs = find_optimal_pairs(&series, Penalty::Symmetric(0.0)).unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn scenario_d_penalty_suppresses_spike() {
    let series = [10.0, 10.0, 9.5, 12.0, 9.8, 10.1];
    // (1 - 0.15) * 12 - (1 + 0.15) * 9.5 < 0
    let pairs = find_optimal_pairs(&series, Penalty::Symmetric(0.15)).unwrap();
    assert!(pairs.is_empty());

    let pairs = find_optimal_pairs(&series, Penalty::Symmetric(0.01)).unwrap();
    assert_eq!(pairs[0].as_tuple(), (2, 3));
}

#[test]
fn short_series_yield_no_pairs() {
    assert!(find_optimal_pairs(&[], Penalty::default()).unwrap().is_empty());
    assert!(find_optimal_pairs(&[1.0], Penalty::default())
        .unwrap()
        .is_empty());
}

#[test]
fn penalty_arity_is_checked_at_construction() {
    let components: [f64; 3] = [0.001, 0.002, 0.003];
    let err = Penalty::try_from(components.as_slice()).unwrap_err();
    assert_eq!(err, FinderError::InvalidPenaltyArity { len: 3 });
}

#[test]
fn asymmetric_penalty_from_tuple() {
    let penalty = Penalty::try_from((0.001_f64, 0.004_f64)).unwrap();
    let pairs = find_optimal_pairs(&SCENARIO_A, penalty).unwrap();

    assert!(!pairs.is_empty());
    for pair in &pairs {
        assert!(is_net_positive(&SCENARIO_A, &penalty, pair.opt_in, pair.opt_out));
    }
}

#[test]
fn finder_runs_are_deterministic() {
    let series: Vec<f64> = (0..300)
        .map(|i| 100.0 + (i as f64 * 0.21).sin() * 3.0 + (i as f64 * 1.7).cos())
        .collect();

    let mut finder = PairFinder::new(series.clone(), Penalty::Symmetric(0.003)).unwrap();
    let first = finder.run().to_vec();
    let second = finder.run().to_vec();
    assert_eq!(first, second);
    assert_eq!(
        first,
        find_optimal_pairs(&series, Penalty::Symmetric(0.003)).unwrap()
    );

    for window in first.windows(2) {
        assert!(window[0].opt_out <= window[1].opt_in);
    }
}

#[test]
fn csv_series_through_report() {
    let csv = "timestamp,close\n\
               2024-01-01T00:00:00Z,5.94\n\
               2024-01-01T01:00:00Z,5.89\n\
               2024-01-01T02:00:00Z,5.97\n\
               2024-01-01T03:00:00Z,6.0\n\
               2024-01-01T04:00:00Z,5.98\n\
               2024-01-01T05:00:00Z,6.07\n\
               2024-01-01T06:00:00Z,5.88\n\
               2024-01-01T07:00:00Z,5.98\n\
               2024-01-01T08:00:00Z,5.9\n";

    let series: PriceSeries = CsvSeriesLoader::from_content(csv, "close").load().unwrap();
    let result = scan_series(&series, Penalty::Symmetric(0.0025)).unwrap();

    assert_eq!(tuples(&result.pairs), vec![(1, 5), (6, 7)]);
    let first = &result.report.outcomes[0];
    assert_eq!(
        first.opt_in_time.map(|t| t.to_rfc3339()),
        Some("2024-01-01T01:00:00+00:00".to_string())
    );
    assert!(result.report.total_net_gain > rust_decimal::Decimal::ZERO);
}

#[test]
fn date_window_limits_scanned_samples() {
    let csv = "timestamp,close\n\
               2024-01-01T00:00:00Z,9.0\n\
               2024-01-02T00:00:00Z,10.0\n\
               2024-01-03T00:00:00Z,12.0\n\
               2024-01-04T00:00:00Z,8.0\n\
               2024-01-05T00:00:00Z,11.0\n";

    let mut config = optitrade::Config::default();
    config.data.start = Some("2024-01-04".to_string());
    config.data.end = Some("2024-01-05".to_string());
    let (start, end) = config.data.date_range().unwrap().unwrap();

    let series = CsvSeriesLoader::from_content(csv, "close")
        .load()
        .unwrap()
        .between(start, end);
    assert_eq!(series.values, vec![8.0, 11.0]);

    let result = scan_series(&series, Penalty::Symmetric(0.0025)).unwrap();
    assert_eq!(tuples(&result.pairs), vec![(0, 1)]);
}
