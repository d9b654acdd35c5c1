//! Sample: one intraday OHLC observation, and Series: a session's worth of them.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// OHLC observation for one sampling interval (a 5-minute block by default).
///
/// The timestamp is session-local: it carries the market's UTC offset so the
/// dashboard can print exchange time without another timezone lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Sample {
    /// Returns true if any OHLC field is NaN.
    fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high bounds everything from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Ordered samples for one instrument for the current session.
///
/// Samples are kept in the order the quote source produced them (timestamp
/// ascending). Nothing here sorts or deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<Sample>);

impl Series {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self(samples)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.0.last()
    }
}

impl From<Vec<Sample>> for Series {
    fn from(samples: Vec<Sample>) -> Self {
        Self(samples)
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
