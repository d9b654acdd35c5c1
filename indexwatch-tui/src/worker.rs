//! Background refresh worker: all network I/O runs here.
//!
//! The main thread sends `Refresh` on every timer tick (or on `r`); the worker
//! fetches every instrument through the quote cache, runs the metrics engine
//! and sends the finished snapshot back. Rendering never waits on the network.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;

use indexwatch_core::data::{fetch_all, series_map, CachedQuoteSource, DataError, QuoteSource};
use indexwatch_core::{compute, Instrument, MarketSession, Series, SummaryTable};

/// Commands sent from the TUI to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerCommand {
    /// Fetch and recompute. `force` drops cached series first.
    Refresh { force: bool },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    Snapshot(Box<Snapshot>),
}

/// One refresh cycle's result: raw series for the charts plus the summary table.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub session_date: NaiveDate,
    /// Every configured instrument, in order; empty when nothing was fetched.
    pub series: IndexMap<Instrument, Series>,
    pub table: SummaryTable,
    pub failures: Vec<(Instrument, DataError)>,
    /// False while the source refuses requests (circuit breaker open).
    pub source_available: bool,
}

impl Snapshot {
    pub fn series_for(&self, instrument: &Instrument) -> Option<&Series> {
        self.series.get(instrument).filter(|s| !s.is_empty())
    }
}

/// Everything the worker needs to produce a snapshot.
pub struct RefreshJob {
    source: CachedQuoteSource<Box<dyn QuoteSource>>,
    instruments: Vec<Instrument>,
    session: MarketSession,
}

impl RefreshJob {
    pub fn new(
        source: CachedQuoteSource<Box<dyn QuoteSource>>,
        instruments: Vec<Instrument>,
        session: MarketSession,
    ) -> Self {
        Self { source, instruments, session }
    }

    pub fn run(&self, now: DateTime<Utc>, force: bool) -> Snapshot {
        if force {
            self.source.clear();
        }
        let session_date = self.session.session_date(now);
        let outcomes = fetch_all(&self.source, &self.instruments, &self.session, session_date);

        let table = compute(&self.instruments, &series_map(&outcomes));
        let failures = outcomes
            .iter()
            .filter_map(|(inst, outcome)| outcome.error().map(|e| (inst.clone(), e.clone())))
            .collect();
        let series = outcomes
            .into_iter()
            .map(|(inst, outcome)| (inst, outcome.into_series()))
            .collect();

        tracing::debug!(
            date = %session_date,
            rows = table.len(),
            instruments = self.instruments.len(),
            "refresh complete"
        );

        Snapshot {
            taken_at: now,
            session_date,
            series,
            table,
            failures,
            source_available: self.source.is_available(),
        }
    }
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    job: RefreshJob,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("indexwatch-worker".into())
        .spawn(move || worker_loop(job, rx, tx))
}

fn worker_loop(job: RefreshJob, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Refresh { force }) => {
                let snapshot = job.run(Utc::now(), force);
                if tx.send(WorkerResponse::Snapshot(Box::new(snapshot))).is_err() {
                    // UI is gone.
                    break;
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}
