//! indexwatch: live terminal dashboard for intraday index metrics.
//!
//! Layout:
//! 1. Header: last update, market state, chart window
//! 2. Summary table: open/high/low/current, gain/loss, breakout signal
//! 3. Charts: close over the window with session high/low/current lines
//! 4. Status bar: key hints and the last message

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use indexwatch_core::config::DEFAULT_CONFIG_FILE;
use indexwatch_core::data::{
    CachedQuoteSource, CircuitBreaker, QuoteSource, SyntheticSource, YahooProvider,
};
use indexwatch_core::DashboardConfig;

use crate::app::AppState;
use crate::worker::{RefreshJob, WorkerCommand, WorkerResponse};

#[derive(Parser)]
#[command(name = "indexwatch", version, about = "Live intraday index dashboard")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Use seeded synthetic quotes instead of Yahoo Finance
    #[arg(long)]
    synthetic: bool,

    /// Seed for --synthetic
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log file (the terminal belongs to the dashboard)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;

    let config = DashboardConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let source = build_source(&args)?;
    let source_name = source.name().to_string();
    tracing::info!(source = %source_name, instruments = config.instruments.len(), "starting dashboard");

    let job = RefreshJob::new(
        CachedQuoteSource::new(source, Duration::from_secs(config.cache_ttl_secs)),
        config.instruments.clone(),
        config.session.clone(),
    );

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle =
        worker::spawn_worker(job, cmd_rx, resp_tx).context("failed to spawn refresh worker")?;

    let prefs_path = persistence::default_path();
    let prefs = persistence::load(&prefs_path);
    let mut app = AppState::new(config, source_name, cmd_tx.clone(), resp_rx, prefs_path);
    persistence::apply(&mut app, prefs);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    if let Err(e) = persistence::save(&app.prefs_path, &persistence::extract(&app)) {
        tracing::warn!(error = %e, "failed to save prefs");
    }

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    // The worker may be mid-fetch; it exits after the current refresh.
    drop(worker_handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("dashboard stopped");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Timer: ask for a new snapshot every refresh interval.
        if app.refresh_due(Instant::now()) {
            app.request_refresh(false);
        }

        // 2. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 3. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            match resp {
                WorkerResponse::Snapshot(snapshot) => app.apply_snapshot(*snapshot),
            }
        }

        // 4. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn build_source(args: &Args) -> Result<Box<dyn QuoteSource>> {
    if args.synthetic {
        return Ok(Box::new(SyntheticSource::new(args.seed)));
    }
    let breaker = Arc::new(CircuitBreaker::for_polling());
    let provider = YahooProvider::new(breaker).context("failed to build Yahoo Finance client")?;
    Ok(Box::new(provider))
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("indexwatch")
        .join("indexwatch.log")
}

/// File-only logging; `RUST_LOG` overrides the default filter.
fn init_logging(path: &Path) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;

    let filter_str = "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry().with(env_filter).with(file_layer).init();
    Ok(())
}
