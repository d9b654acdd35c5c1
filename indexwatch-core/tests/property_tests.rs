//! Property tests for metrics engine invariants.
//!
//! Uses proptest to verify:
//! 1. Range bounds: low <= open, current <= high for every summary
//! 2. Gain is never negative and loss never positive
//! 3. Window length is min(n, len) and is a suffix of the series
//! 4. A single sample never signals; signals agree with the earlier range
//! 5. compute() keeps input order and skips empty series

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use indexwatch_core::{breakout_signal, compute, tail_window, Instrument, Sample, Series, Signal};
use proptest::prelude::*;
use std::collections::HashMap;

// ── Strategies (proptest) ────────────────────────────────────────────

fn session_open() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(5 * 3600 + 1800)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 4, 9, 15, 0)
        .unwrap()
}

/// One well-formed candle around `mid`.
fn arb_sample(index: usize) -> impl Strategy<Value = Sample> {
    (100.0..50_000.0_f64, 0.0..1.0_f64, 0.0..1.0_f64, 0.0..50.0_f64).prop_map(
        move |(mid, open_frac, close_frac, spread)| {
            let low = mid - spread;
            let high = mid + spread;
            Sample {
                timestamp: session_open() + Duration::minutes(5 * index as i64),
                open: low + (high - low) * open_frac,
                high,
                low,
                close: low + (high - low) * close_frac,
            }
        },
    )
}

fn arb_series(max_len: usize) -> impl Strategy<Value = Series> {
    (1..=max_len)
        .prop_flat_map(|len| (0..len).map(arb_sample).collect::<Vec<_>>())
        .prop_map(Series::new)
}

// ── 1 & 2. Summary bounds ────────────────────────────────────────────

proptest! {
    #[test]
    fn summary_stays_within_session_range(series in arb_series(80)) {
        let inst = Instrument::new("^NSEI", "Nifty 50");
        let mut map = HashMap::new();
        map.insert(inst.clone(), series.clone());
        let table = compute(std::slice::from_ref(&inst), &map);
        let summary = &table[&inst];

        prop_assert!(summary.low <= summary.open);
        prop_assert!(summary.open <= summary.high);
        prop_assert!(summary.low <= summary.current);
        prop_assert!(summary.current <= summary.high);
        prop_assert!(summary.gain >= 0.0);
        prop_assert!(summary.loss <= 0.0);
        prop_assert_eq!(summary.samples, series.len());
        prop_assert_eq!(summary.current, series.last().unwrap().close);
        prop_assert_eq!(summary.open, series.first().unwrap().open);
        prop_assert_eq!(summary.as_of, series.last().unwrap().timestamp);
    }

    #[test]
    fn percentages_follow_sign_of_absolute_moves(series in arb_series(40)) {
        let inst = Instrument::new("X", "x");
        let map = HashMap::from([(inst.clone(), series)]);
        let summary = compute(std::slice::from_ref(&inst), &map).swap_remove(&inst).unwrap();

        let pct_gain = summary.pct_gain.unwrap();
        let pct_loss = summary.pct_loss.unwrap();
        prop_assert!(pct_gain >= 0.0);
        prop_assert!(pct_loss <= 0.0);
        prop_assert!((pct_gain - summary.gain / summary.open * 100.0).abs() < 1e-9);
    }
}

// ── 3. Windows ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn window_is_a_suffix_of_requested_length(series in arb_series(80), n in 0usize..120) {
        let window = tail_window(&series, n);
        prop_assert_eq!(window.len(), n.min(series.len()));
        let offset = series.len() - window.len();
        prop_assert_eq!(window, &series.samples()[offset..]);
    }
}

// ── 4. Signals ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn single_sample_never_signals(sample in arb_sample(0)) {
        prop_assert_eq!(breakout_signal(&[sample]), Signal::None);
    }

    #[test]
    fn signal_agrees_with_earlier_range(series in arb_series(60)) {
        let samples = series.samples();
        let signal = breakout_signal(samples);
        if samples.len() < 2 {
            prop_assert_eq!(signal, Signal::None);
        } else {
            let (last, earlier) = samples.split_last().unwrap();
            let prior_high = earlier.iter().map(|s| s.high).fold(f64::NEG_INFINITY, f64::max);
            let prior_low = earlier.iter().map(|s| s.low).fold(f64::INFINITY, f64::min);
            match signal {
                Signal::BullishBreakout => prop_assert!(last.close > prior_high),
                Signal::BearishBreakdown => prop_assert!(last.close < prior_low),
                Signal::None => {
                    prop_assert!(last.close <= prior_high && last.close >= prior_low)
                }
            }
        }
    }
}

// ── 5. Table ordering ────────────────────────────────────────────────

proptest! {
    #[test]
    fn table_preserves_order_and_skips_empty(
        lens in prop::collection::vec(0usize..5, 1..8),
    ) {
        let instruments: Vec<Instrument> = (0..lens.len())
            .map(|i| Instrument::new(format!("SYM{i}"), format!("Index {i}")))
            .collect();
        let map: HashMap<Instrument, Series> = instruments
            .iter()
            .zip(&lens)
            .map(|(inst, &len)| {
                let samples = (0..len)
                    .map(|i| Sample {
                        timestamp: session_open() + Duration::minutes(5 * i as i64),
                        open: 100.0,
                        high: 101.0,
                        low: 99.0,
                        close: 100.5,
                    })
                    .collect();
                (inst.clone(), Series::new(samples))
            })
            .collect();

        let table = compute(&instruments, &map);
        let expected: Vec<&Instrument> = instruments
            .iter()
            .zip(&lens)
            .filter(|(_, &len)| len > 0)
            .map(|(inst, _)| inst)
            .collect();
        let actual: Vec<&Instrument> = table.keys().collect();
        prop_assert_eq!(actual, expected);
    }
}
