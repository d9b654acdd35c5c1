//! Quote sources and the boundary that turns their failures into missing data.

pub mod cache;
pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use cache::CachedQuoteSource;
pub use circuit_breaker::CircuitBreaker;
pub use provider::{fetch_all, series_map, DataError, FetchOutcome, QuoteSource};
pub use synthetic::SyntheticSource;
pub use yahoo::YahooProvider;
