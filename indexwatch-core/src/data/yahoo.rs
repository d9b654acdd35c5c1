//! Yahoo Finance intraday quote source.
//!
//! Pulls today's 5-minute candles from the v8 chart API (`range=1d`), keeps
//! only the samples that fall on the requested session date, and maps HTTP
//! trouble into `DataError` with retries and a circuit breaker.
//!
//! Yahoo has no official API and changes its response shape without notice;
//! parse failures surface as `ResponseFormatChanged`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, QuoteSource};
use crate::domain::Sample;
use crate::session::MarketSession;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Chart URL for today's intraday candles at the session's granularity.
    ///
    /// Index symbols carry `^` and `=`, so the path segment is percent-encoded.
    fn chart_url(symbol: &str, interval_minutes: u32) -> Result<reqwest::Url, DataError> {
        let mut url =
            reqwest::Url::parse(&format!("{CHART_BASE_URL}/{}", urlencoding::encode(symbol)))
                .map_err(|e| DataError::Other(format!("invalid chart URL for {symbol}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", &format!("{interval_minutes}m"))
            .append_pair("includePrePost", "false");
        Ok(url)
    }

    /// Turn a chart response into session samples.
    ///
    /// Rows missing any OHLC value are dropped (Yahoo pads the current,
    /// unfinished candle with nulls). Rows from other days are dropped too, as
    /// are rows whose high/low do not bound the open and close.
    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound { symbol: symbol.to_string() });
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )));
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged("empty result with no error".into()));
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };

        // Before the first candle of the day Yahoo omits timestamps entirely.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut samples = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = session.localize(ts).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;
            if !session.is_on_date(&timestamp, date) {
                continue;
            }

            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let (Some(open), Some(high), Some(low), Some(close)) = (
                field(&quote.open),
                field(&quote.high),
                field(&quote.low),
                field(&quote.close),
            ) else {
                continue;
            };

            let sample = Sample { timestamp, open, high, low, close };
            if !sample.is_sane() {
                tracing::debug!(symbol, ?sample, "dropping inconsistent candle");
                continue;
            }
            samples.push(sample);
        }

        Ok(samples)
    }

    /// One request with retry, backoff and circuit breaker handling.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        let url = Self::chart_url(symbol, session.interval_minutes)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying quote fetch");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                tracing::debug!(
                    symbol,
                    remaining_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                    "circuit breaker open, not requesting"
                );
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url.clone()).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound { symbol: symbol.to_string() });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            let samples = Self::parse_response(symbol, chart, session, date)?;
            self.circuit_breaker.record_success();
            return Ok(samples);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl QuoteSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        session: &MarketSession,
        date: NaiveDate,
    ) -> Result<Vec<Sample>, DataError> {
        self.fetch_with_retry(symbol, session, date)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
