//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};

use indexwatch_core::DashboardConfig;

use crate::worker::{Snapshot, WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Other => "ERR",
        }
    }

    /// Map a `DataError::category()` tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "network" => ErrorCategory::Network,
            "data" => ErrorCategory::Data,
            _ => ErrorCategory::Other,
        }
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    pub config: DashboardConfig,
    pub source_name: String,
    pub running: bool,

    // Data
    pub snapshot: Option<Snapshot>,
    /// Whether the last snapshot's table differs from the one before it.
    pub table_changed: bool,
    pub refresh_in_flight: bool,
    /// `r` pressed while a refresh was running; sent when it lands.
    pub forced_refresh_queued: bool,
    pub last_refresh_request: Option<Instant>,

    /// Requested chart window in blocks; clamped against the session clock
    /// whenever it is read.
    pub window_blocks: usize,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub prefs_path: PathBuf,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        source_name: impl Into<String>,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        prefs_path: PathBuf,
    ) -> Self {
        let window_blocks = config.default_window_blocks;
        Self {
            config,
            source_name: source_name.into(),
            running: true,
            snapshot: None,
            table_changed: false,
            refresh_in_flight: false,
            forced_refresh_queued: false,
            last_refresh_request: None,
            window_blocks,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            prefs_path,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config.refresh_secs.max(1))
    }

    /// Timer check: nothing in flight and the interval has elapsed.
    pub fn refresh_due(&self, now: Instant) -> bool {
        if self.refresh_in_flight {
            return false;
        }
        match self.last_refresh_request {
            None => true,
            Some(at) => now.duration_since(at) >= self.refresh_interval(),
        }
    }

    /// Ask the worker for a new snapshot.
    ///
    /// At most one request is outstanding. A forced refresh during a running
    /// one is queued and sent when that snapshot arrives.
    pub fn request_refresh(&mut self, force: bool) {
        if self.refresh_in_flight {
            if force {
                self.forced_refresh_queued = true;
                self.set_status("Refresh queued...");
            }
            return;
        }
        match self.worker_tx.send(WorkerCommand::Refresh { force }) {
            Ok(()) => {
                self.refresh_in_flight = true;
                self.last_refresh_request = Some(Instant::now());
                if force {
                    self.set_status("Refreshing...");
                }
            }
            Err(_) => {
                self.push_error(
                    ErrorCategory::Other,
                    "refresh worker is not running".into(),
                    "refresh".into(),
                );
            }
        }
    }

    /// Install a fresh snapshot from the worker.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.refresh_in_flight = false;
        self.table_changed = self
            .snapshot
            .as_ref()
            .is_some_and(|previous| previous.table != snapshot.table);

        for (instrument, err) in &snapshot.failures {
            self.push_error_once(
                ErrorCategory::from_tag(err.category()),
                err.to_string(),
                instrument.to_string(),
            );
        }

        let total = self.config.instruments.len();
        let rows = snapshot.table.len();
        if snapshot.failures.is_empty() {
            self.set_status(format!(
                "Updated {}: {rows}/{total} instruments with data",
                snapshot.taken_at.with_timezone(&self.config.session.timezone).format("%H:%M:%S")
            ));
        } else {
            self.set_warning(format!(
                "{} of {total} fetches failed; showing what is available",
                snapshot.failures.len()
            ));
        }
        if !snapshot.source_available {
            self.set_warning(format!("{} is refusing requests; retrying after cooldown", self.source_name));
        }
        self.snapshot = Some(snapshot);

        if std::mem::take(&mut self.forced_refresh_queued) {
            self.request_refresh(true);
        }
    }

    /// Effective window size at `now`, within `[1, max_blocks]`.
    pub fn effective_blocks(&self, now: DateTime<Utc>) -> usize {
        self.config.session.clamp_blocks(now, self.window_blocks)
    }

    pub fn grow_window(&mut self, now: DateTime<Utc>) {
        self.window_blocks = self.config.session.clamp_blocks(now, self.effective_blocks(now) + 1);
    }

    pub fn shrink_window(&mut self, now: DateTime<Utc>) {
        self.window_blocks =
            self.config.session.clamp_blocks(now, self.effective_blocks(now).saturating_sub(1));
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Like `push_error`, but a failure repeating on every tick is recorded
    /// once until something else happens for that instrument.
    fn push_error_once(&mut self, category: ErrorCategory, message: String, context: String) {
        let window = self.config.instruments.len().max(1);
        let repeated = self
            .error_history
            .iter()
            .take(window)
            .any(|r| r.context == context && r.message == message);
        if !repeated {
            self.push_error(category, message, context);
        }
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;
    use indexwatch_core::data::DataError;
    use indexwatch_core::{compute, Instrument, Series};
    use std::collections::HashMap;
    use std::sync::mpsc;

    /// App wired to live channels; the receivers are returned so sends succeed.
    pub(crate) fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>, mpsc::Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let app = AppState::new(
            DashboardConfig::default(),
            "test",
            cmd_tx,
            resp_rx,
            PathBuf::from("."),
        );
        (app, cmd_rx, resp_tx)
    }

    pub(crate) fn snapshot_with(series: Vec<(Instrument, Series)>, failures: Vec<(Instrument, DataError)>) -> Snapshot {
        let instruments: Vec<Instrument> = series.iter().map(|(i, _)| i.clone()).collect();
        let map: HashMap<Instrument, Series> = series.iter().cloned().collect();
        Snapshot {
            taken_at: Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap(),
            session_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            table: compute(&instruments, &map),
            series: series.into_iter().collect::<IndexMap<_, _>>(),
            failures,
            source_available: true,
        }
    }

    /// 10:30 IST on a Monday: 75 minutes in, 15 blocks available.
    pub(crate) fn mid_session() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap()
    }

    #[test]
    fn first_tick_is_due_and_in_flight_blocks_timer() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        assert!(app.refresh_due(Instant::now()));

        app.request_refresh(false);
        assert_eq!(cmd_rx.try_recv().unwrap(), WorkerCommand::Refresh { force: false });
        assert!(app.refresh_in_flight);
        assert!(!app.refresh_due(Instant::now() + Duration::from_secs(60)));

        // A second timer request while busy is dropped.
        app.request_refresh(false);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn forced_refresh_while_busy_waits_for_the_running_one() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        app.request_refresh(false);
        assert_eq!(cmd_rx.try_recv().unwrap(), WorkerCommand::Refresh { force: false });

        // Pressing `r` twice mid-fetch sends nothing yet.
        app.request_refresh(true);
        app.request_refresh(true);
        assert!(cmd_rx.try_recv().is_err());
        assert!(app.forced_refresh_queued);

        // The running fetch lands: exactly one forced refresh follows and is
        // the only one outstanding.
        app.apply_snapshot(snapshot_with(vec![], vec![]));
        assert_eq!(cmd_rx.try_recv().unwrap(), WorkerCommand::Refresh { force: true });
        assert!(cmd_rx.try_recv().is_err());
        assert!(app.refresh_in_flight);
        assert!(!app.forced_refresh_queued);
        assert!(!app.refresh_due(Instant::now() + Duration::from_secs(60)));

        app.apply_snapshot(snapshot_with(vec![], vec![]));
        assert!(!app.refresh_in_flight);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn refusing_source_is_reported() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let mut snapshot = snapshot_with(vec![], vec![]);
        snapshot.source_available = false;
        app.apply_snapshot(snapshot);
        let (msg, level) = app.status_message.clone().unwrap();
        assert_eq!(level, StatusLevel::Warning);
        assert!(msg.contains("refusing requests"));
    }

    #[test]
    fn refresh_due_after_interval() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.request_refresh(false);
        app.apply_snapshot(snapshot_with(vec![], vec![]));
        let at = app.last_refresh_request.unwrap();
        assert!(!app.refresh_due(at + Duration::from_secs(5)));
        assert!(app.refresh_due(at + Duration::from_secs(15)));
    }

    #[test]
    fn dead_worker_is_reported() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        drop(cmd_rx);
        app.request_refresh(true);
        assert!(!app.refresh_in_flight);
        assert_eq!(app.error_history.len(), 1);
    }

    #[test]
    fn window_stays_within_available_blocks() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let now = mid_session();
        assert_eq!(app.effective_blocks(now), 12);

        for _ in 0..10 {
            app.grow_window(now);
        }
        assert_eq!(app.effective_blocks(now), 15);

        for _ in 0..30 {
            app.shrink_window(now);
        }
        assert_eq!(app.effective_blocks(now), 1);
    }

    #[test]
    fn window_preference_is_capped_early_in_session() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.window_blocks = 40;
        // 09:35 IST: 4 blocks
        let early = Utc.with_ymd_and_hms(2024, 3, 4, 4, 5, 0).unwrap();
        assert_eq!(app.effective_blocks(early), 4);
    }

    #[test]
    fn table_change_is_tracked_between_snapshots() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let inst = Instrument::new("^NSEI", "Nifty 50 (India)");
        let ts = mid_session().with_timezone(&app.config.session.timezone).fixed_offset();
        let sample = |close: f64| indexwatch_core::Sample { timestamp: ts, open: 100.0, high: 110.0, low: 90.0, close };

        app.apply_snapshot(snapshot_with(vec![(inst.clone(), Series::new(vec![sample(100.0)]))], vec![]));
        assert!(!app.table_changed);

        app.apply_snapshot(snapshot_with(vec![(inst.clone(), Series::new(vec![sample(100.0)]))], vec![]));
        assert!(!app.table_changed);

        app.apply_snapshot(snapshot_with(vec![(inst, Series::new(vec![sample(105.0)]))], vec![]));
        assert!(app.table_changed);
    }

    #[test]
    fn repeated_failures_are_recorded_once() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        let inst = Instrument::new("^NSEI", "Nifty 50 (India)");
        let failure = || vec![(inst.clone(), DataError::NetworkUnreachable("timeout".into()))];

        app.apply_snapshot(snapshot_with(vec![], failure()));
        app.apply_snapshot(snapshot_with(vec![], failure()));
        assert_eq!(app.error_history.len(), 1);
        assert_eq!(app.error_history[0].category, ErrorCategory::Network);
        assert_eq!(app.status_message.as_ref().map(|(_, l)| *l), Some(StatusLevel::Warning));
    }

    #[test]
    fn error_history_caps_at_50() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Other, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }
}
