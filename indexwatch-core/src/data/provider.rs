//! Quote source trait, structured data errors, and the per-instrument fetch outcome.
//!
//! The `QuoteSource` trait abstracts over where intraday samples come from
//! (Yahoo Finance, synthetic data) so the dashboard can swap implementations
//! and tests can run offline.
//!
//! Failures never reach the metrics engine as errors. Each instrument's fetch
//! becomes a `FetchOutcome`, and a failed outcome reads as an empty series.

use std::collections::HashMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use thiserror::Error;

use crate::domain::{Instrument, Sample, Series};
use crate::session::MarketSession;

/// Structured error types for quote fetching.
///
/// Displayable in both the CLI and the TUI error history.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: quote provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Short category tag for error listings.
    pub fn category(&self) -> &'static str {
        match self {
            DataError::NetworkUnreachable(_)
            | DataError::RateLimited { .. }
            | DataError::CircuitBreakerTripped => "network",
            DataError::ResponseFormatChanged(_) | DataError::SymbolNotFound { .. } => "data",
            DataError::AuthenticationRequired(_) | DataError::Other(_) => "other",
        }
    }
}

/// Trait for intraday quote sources.
///
/// Implementations return the samples of one trading session, ascending by
/// timestamp. An unknown symbol or a session that has not started yields an
/// empty vector or a `DataError`; callers treat both as "no data yet".
pub trait QuoteSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the samples for `symbol` on the session date `date`.
    fn fetch_intraday(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError>;

    /// Whether the source is currently accepting requests.
    fn is_available(&self) -> bool;
}

impl<S: QuoteSource + ?Sized> QuoteSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        (**self).fetch_intraday(symbol, session, date)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Result of fetching one instrument: data, nothing yet, or a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Data(Series),
    Empty,
    Failed(DataError),
}

impl FetchOutcome {
    /// Classify a raw source result.
    pub fn from_result(result: Result<Vec<Sample>, DataError>) -> Self {
        match result {
            Ok(samples) if samples.is_empty() => FetchOutcome::Empty,
            Ok(samples) => FetchOutcome::Data(Series::new(samples)),
            Err(err) => FetchOutcome::Failed(err),
        }
    }

    /// The series to hand to the engine. Failures read as empty.
    pub fn into_series(self) -> Series {
        match self {
            FetchOutcome::Data(series) => series,
            FetchOutcome::Empty | FetchOutcome::Failed(_) => Series::empty(),
        }
    }

    pub fn error(&self) -> Option<&DataError> {
        match self {
            FetchOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, FetchOutcome::Data(_))
    }
}

/// Fetch every instrument from `source`, in order.
///
/// One instrument failing does not affect the others; the failure is logged
/// and recorded as `FetchOutcome::Failed`. A source that is refusing requests
/// is not called at all: every instrument fails with `CircuitBreakerTripped`.
pub fn fetch_all<S: QuoteSource + ?Sized>(
    source: &S,
    instruments: &[Instrument],
    session: &MarketSession,
    date: NaiveDate,
) -> IndexMap<Instrument, FetchOutcome> {
    if !source.is_available() {
        tracing::warn!(source = source.name(), "quote source unavailable, skipping refresh");
        return instruments
            .iter()
            .map(|instrument| {
                (instrument.clone(), FetchOutcome::Failed(DataError::CircuitBreakerTripped))
            })
            .collect();
    }

    instruments
        .iter()
        .map(|instrument| {
            let outcome =
                FetchOutcome::from_result(source.fetch_intraday(&instrument.symbol, session, date));
            match &outcome {
                FetchOutcome::Data(series) => tracing::debug!(
                    source = source.name(),
                    symbol = %instrument.symbol,
                    samples = series.len(),
                    "fetched intraday series"
                ),
                FetchOutcome::Empty => tracing::info!(
                    source = source.name(),
                    symbol = %instrument.symbol,
                    "no intraday data yet"
                ),
                FetchOutcome::Failed(err) => tracing::warn!(
                    source = source.name(),
                    symbol = %instrument.symbol,
                    error = %err,
                    "intraday fetch failed, treating as missing data"
                ),
            }
            (instrument.clone(), outcome)
        })
        .collect()
}

/// Flatten fetch outcomes into the engine's input mapping.
pub fn series_map(outcomes: &IndexMap<Instrument, FetchOutcome>) -> HashMap<Instrument, Series> {
    outcomes
        .iter()
        .map(|(instrument, outcome)| (instrument.clone(), outcome.clone().into_series()))
        .collect()
}
