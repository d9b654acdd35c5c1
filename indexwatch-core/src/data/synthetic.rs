//! Synthetic intraday data for offline use and demos.
//!
//! Produces a seeded random walk of 5-minute candles (or whatever the session
//! interval is) from the open up to the current time. The same seed, symbol
//! and date always give the same series, so a refresh during the session only
//! appends candles.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, QuoteSource};
use crate::domain::Sample;
use crate::session::MarketSession;

pub struct SyntheticSource {
    seed: u64,
    /// Fixed clock for tests; `None` reads the system clock.
    as_of: Option<DateTime<Utc>>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self { seed, as_of: None }
    }

    /// Pin the clock, so the series length does not depend on when it runs.
    pub fn with_clock(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.as_of.unwrap_or_else(Utc::now)
    }

    /// Candles that exist for `date` as of the source clock.
    fn completed_blocks(&self, session: &MarketSession, date: NaiveDate) -> usize {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return 0;
        }
        let interval = session.interval_minutes.max(1);
        let now = self.now();
        let today = session.session_date(now);
        let minutes = match date.cmp(&today) {
            std::cmp::Ordering::Less => session.length_minutes(),
            std::cmp::Ordering::Equal => session.minutes_elapsed(now),
            std::cmp::Ordering::Greater => 0,
        };
        (minutes / interval) as usize
    }

    /// Deterministic sub-seed for one (seed, symbol, day), independent of
    /// the order symbols are fetched in.
    fn sub_seed(&self, symbol: &str, date: NaiveDate) -> u64 {
        let day = i64::from(date.num_days_from_ce());
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(&day.to_le_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(42)
    }
}

impl QuoteSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        let blocks = self.completed_blocks(session, date);
        if blocks == 0 {
            return Ok(Vec::new());
        }
        let open_at = session
            .open_at(date)
            .ok_or_else(|| DataError::Other(format!("no session open on {date}")))?
            .fixed_offset();

        let sub_seed = self.sub_seed(symbol, date);
        let mut rng = StdRng::seed_from_u64(sub_seed);
        let mut price = 10_000.0 + (sub_seed % 40_000) as f64;
        let step = Duration::minutes(i64::from(session.interval_minutes.max(1)));

        let mut samples = Vec::with_capacity(blocks);
        for i in 0..blocks {
            let open = price;
            let close = open * (1.0 + rng.gen_range(-0.002..0.002));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0008));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0008));
            samples.push(Sample { timestamp: open_at + step * i as i32, open, high, low, close });
            price = close;
        }
        Ok(samples)
    }

    fn is_available(&self) -> bool {
        true
    }
}
