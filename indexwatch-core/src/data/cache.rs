//! Short-lived cache in front of a quote source.
//!
//! The dashboard refreshes every few seconds; the cache keeps it from hitting
//! the provider more often than the TTL allows. Only successful fetches are
//! stored, so a failure is retried on the next refresh.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use super::provider::{DataError, QuoteSource};
use crate::domain::Sample;
use crate::session::MarketSession;

type CacheKey = (String, NaiveDate);

struct Entry {
    fetched_at: Instant,
    samples: Vec<Sample>,
}

pub struct CachedQuoteSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl<S: QuoteSource> CachedQuoteSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self { inner, ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop everything; the next fetch goes to the provider.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of cached series, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: QuoteSource> QuoteSource for CachedQuoteSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        let key = (symbol.to_string(), date);
        if let Some(entry) = self.entries().get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::trace!(symbol, "quote cache hit");
                return Ok(entry.samples.clone());
            }
        }

        // The lock is not held across the network call.
        let samples = self.inner.fetch_intraday(symbol, session, date)?;
        self.entries().insert(key, Entry { fetched_at: Instant::now(), samples: samples.clone() });
        Ok(samples)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
