//! indexwatch core: domain types, intraday metrics, session clock, quote sources.
//!
//! This crate holds everything below the presentation layer:
//! - Domain types (instruments, samples, series)
//! - The metrics engine: per-instrument summary and breakout/breakdown signal
//! - Market session clock (timezone, open/close, block counting)
//! - Quote sources (Yahoo Finance, synthetic) behind the `QuoteSource` trait
//! - TOML configuration for the fixed instrument list
//!
//! The metrics engine is pure: no I/O, no logging, no caching. All of that
//! lives at the quote-source boundary.

pub mod config;
pub mod data;
pub mod domain;
pub mod metrics;
pub mod session;

pub use config::{ConfigError, DashboardConfig};
pub use domain::{Instrument, Sample, Series};
pub use metrics::{breakout_signal, compute, tail_window, Signal, Summary, SummaryTable};
pub use session::MarketSession;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the refresh worker moves across threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Instrument>();
        require_sync::<Instrument>();
        require_send::<Sample>();
        require_sync::<Sample>();
        require_send::<Series>();
        require_sync::<Series>();
        require_send::<Summary>();
        require_sync::<Summary>();
        require_send::<SummaryTable>();
        require_sync::<SummaryTable>();
        require_send::<MarketSession>();
        require_sync::<MarketSession>();
        require_send::<DashboardConfig>();
        require_sync::<DashboardConfig>();

        require_send::<data::FetchOutcome>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CachedQuoteSource<data::SyntheticSource>>();
        require_sync::<data::CachedQuoteSource<data::SyntheticSource>>();
    }

    /// Architecture contract: the engine takes snapshots, not sources.
    ///
    /// `compute` accepts already-fetched series. If someone threads a
    /// `QuoteSource` through it, this stops compiling.
    #[test]
    fn compute_takes_snapshots_only() {
        fn _check(
            instruments: &[Instrument],
            series: &std::collections::HashMap<Instrument, Series>,
        ) -> SummaryTable {
            compute(instruments, series)
        }
    }
}
