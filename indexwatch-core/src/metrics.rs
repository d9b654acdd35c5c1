//! Intraday metrics engine.
//!
//! Given a snapshot of each instrument's session series, computes the summary
//! row the dashboard shows: open, high, low, current, gain/loss against the
//! open, and a breakout/breakdown signal for the latest sample.
//!
//! Everything here is a pure function of its inputs. No I/O, no logging, no
//! caching; the engine holds no state between calls.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::{Instrument, Sample, Series};

/// Breakout state of the latest sample relative to the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Latest close is above every earlier high.
    BullishBreakout,
    /// Latest close is below every earlier low.
    BearishBreakdown,
    /// Inside the earlier range, or not enough history to tell.
    None,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::BullishBreakout => "Bullish Breakout",
            Signal::BearishBreakdown => "Bearish Breakdown",
            Signal::None => "None",
        }
    }

    pub fn is_bullish(self) -> bool {
        self == Signal::BullishBreakout
    }

    pub fn is_bearish(self) -> bool {
        self == Signal::BearishBreakdown
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-instrument statistics for one snapshot.
///
/// Percentages are `None` when the session open is zero: the move is
/// unmeasurable, which is different from "no move".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub current: f64,
    /// high - open
    pub gain: f64,
    pub pct_gain: Option<f64>,
    /// low - open
    pub loss: f64,
    pub pct_loss: Option<f64>,
    pub signal: Signal,
    /// Number of samples the summary was computed from.
    pub samples: usize,
    /// Timestamp of the latest sample.
    pub as_of: DateTime<FixedOffset>,
}

impl Summary {
    /// Summarize a non-empty run of samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;

        let open = first.open;
        let current = last.close;
        let high = max_high(samples);
        let low = min_low(samples);

        let gain = high - open;
        let loss = low - open;

        Some(Self {
            open,
            high,
            low,
            current,
            gain,
            pct_gain: percent_of(gain, open),
            loss,
            pct_loss: percent_of(loss, open),
            signal: breakout_signal(samples),
            samples: samples.len(),
            as_of: last.timestamp,
        })
    }
}

/// Ordered instrument → summary mapping, in the caller's instrument order.
pub type SummaryTable = IndexMap<Instrument, Summary>;

/// Compute summaries for every instrument that has data.
///
/// Instruments whose series is empty or missing from `series_by_instrument`
/// are skipped: they get no entry. The result preserves the iteration order
/// of `instruments`.
pub fn compute(
    instruments: &[Instrument],
    series_by_instrument: &HashMap<Instrument, Series>,
) -> SummaryTable {
    instruments
        .iter()
        .filter_map(|instrument| {
            let series = series_by_instrument.get(instrument)?;
            let summary = Summary::from_samples(series.samples())?;
            Some((instrument.clone(), summary))
        })
        .collect()
}

/// Breakout rule over a run of samples.
///
/// Compares the last close against the high/low of every sample before it.
/// Fewer than two samples means there is no "before", so the signal is `None`.
pub fn breakout_signal(samples: &[Sample]) -> Signal {
    let Some((last, previous)) = samples.split_last() else {
        return Signal::None;
    };
    if previous.is_empty() {
        return Signal::None;
    }

    let current = last.close;
    if current > max_high(previous) {
        Signal::BullishBreakout
    } else if current < min_low(previous) {
        Signal::BearishBreakdown
    } else {
        Signal::None
    }
}

/// The last `min(n, len)` samples of a series, in series order.
///
/// Display only; summaries always use the full series. `n` larger than the
/// series returns everything, `n == 0` returns an empty window.
pub fn tail_window(series: &Series, n: usize) -> &[Sample] {
    let samples = series.samples();
    let start = samples.len().saturating_sub(n);
    &samples[start..]
}

fn max_high(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.high).fold(f64::NEG_INFINITY, f64::max)
}

fn min_low(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.low).fold(f64::INFINITY, f64::min)
}

fn percent_of(delta: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some(delta / base * 100.0)
    }
}
