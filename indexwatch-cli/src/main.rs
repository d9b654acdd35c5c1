mod output;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use indexwatch_core::config::DEFAULT_CONFIG_FILE;
use indexwatch_core::data::{
    fetch_all, series_map, CircuitBreaker, QuoteSource, SyntheticSource, YahooProvider,
};
use indexwatch_core::{breakout_signal, compute, tail_window, DashboardConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "indexwatch-cli", version, about = "Intraday index metrics from the command line")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every instrument once and print the summary table
    Snapshot {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also print the breakout signal over the last N blocks (table format only)
        #[arg(long)]
        blocks: Option<usize>,

        /// Use seeded synthetic quotes instead of Yahoo Finance
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for --synthetic
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// List the configured instruments
    Instruments,

    /// Show the market session clock
    Session,

    /// Write a config file with the default settings
    InitConfig {
        /// Destination (defaults to --config)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Snapshot { format, blocks, synthetic, seed } => {
            let config = load_config(&cli.config)?;
            run_snapshot(&config, format, blocks, synthetic, seed)
        }
        Commands::Instruments => {
            let config = load_config(&cli.config)?;
            run_instruments(&config)
        }
        Commands::Session => {
            let config = load_config(&cli.config)?;
            run_session(&config)
        }
        Commands::InitConfig { path, force } => {
            run_init_config(&path.unwrap_or(cli.config), force)
        }
    }
}

fn load_config(path: &Path) -> Result<DashboardConfig> {
    DashboardConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn run_snapshot(
    config: &DashboardConfig,
    format: OutputFormat,
    blocks: Option<usize>,
    synthetic: bool,
    seed: u64,
) -> Result<()> {
    let source: Box<dyn QuoteSource> = if synthetic {
        Box::new(SyntheticSource::new(seed))
    } else {
        let breaker = Arc::new(CircuitBreaker::for_polling());
        Box::new(YahooProvider::new(breaker).context("failed to build Yahoo Finance client")?)
    };

    let now = Utc::now();
    let session = &config.session;
    let date = session.session_date(now);
    let outcomes = fetch_all(&source, &config.instruments, session, date);

    for (inst, outcome) in &outcomes {
        if let Some(err) = outcome.error() {
            eprintln!("warning: {} ({}): {err}", inst.name, inst.symbol);
        }
    }

    let series = series_map(&outcomes);
    let table = compute(&config.instruments, &series);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => {
            writeln!(
                out,
                "Last updated {} ({})  Market {}  [{}]",
                session.local_now(now).format("%H:%M:%S"),
                session.timezone,
                if session.is_open(now) { "OPEN" } else { "CLOSED" },
                source.name()
            )?;
            writeln!(out)?;
            output::write_table(&mut out, &table)?;

            if let Some(requested) = blocks {
                let n = session.clamp_blocks(now, requested);
                writeln!(out)?;
                writeln!(out, "Last {} minutes ({n} blocks):", n as u32 * session.interval_minutes)?;
                for inst in table.keys() {
                    let Some(s) = series.get(inst) else { continue };
                    let window = tail_window(s, n);
                    writeln!(
                        out,
                        "  {:<24} {:>3} pts  {}",
                        inst.name,
                        window.len(),
                        breakout_signal(window)
                    )?;
                }
            }
        }
        OutputFormat::Json => output::write_json(&mut out, &table)?,
        OutputFormat::Csv => output::write_csv(&mut out, &table)?,
    }

    tracing::debug!(
        instruments = config.instruments.len(),
        with_data = table.len(),
        "snapshot complete"
    );
    Ok(())
}

fn run_instruments(config: &DashboardConfig) -> Result<()> {
    if config.instruments.is_empty() {
        println!("No instruments configured.");
        return Ok(());
    }
    println!("{:<12} NAME", "SYMBOL");
    for inst in &config.instruments {
        println!("{:<12} {}", inst.symbol, inst.name);
    }
    Ok(())
}

fn run_session(config: &DashboardConfig) -> Result<()> {
    let now = Utc::now();
    let session = &config.session;

    println!("Timezone:        {}", session.timezone);
    println!("Local time:      {}", session.local_now(now).format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Session:         {} - {} ({} min, {}-minute blocks)",
        session.open.format("%H:%M"),
        session.close.format("%H:%M"),
        session.length_minutes(),
        session.interval_minutes
    );
    println!("Market:          {}", if session.is_open(now) { "OPEN" } else { "CLOSED" });
    println!(
        "Elapsed:         {} / {} min",
        session.minutes_elapsed(now),
        session.length_minutes()
    );
    println!("Max blocks:      {}", session.max_blocks(now));
    println!(
        "Default window:  {} blocks",
        session.default_blocks(now, config.default_window_blocks)
    );
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    DashboardConfig::default()
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

/// Stderr logging; `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexwatch.toml");

        run_init_config(&path, false).unwrap();
        let written = DashboardConfig::load(&path).unwrap();
        assert_eq!(written, DashboardConfig::default());

        assert!(run_init_config(&path, false).is_err());
        run_init_config(&path, true).unwrap();
    }

    #[test]
    fn cli_parses_snapshot_flags() {
        let cli = Cli::parse_from([
            "indexwatch-cli",
            "snapshot",
            "--format",
            "json",
            "--blocks",
            "6",
            "--synthetic",
        ]);
        match cli.command {
            Commands::Snapshot { format, blocks, synthetic, seed } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(blocks, Some(6));
                assert!(synthetic);
                assert_eq!(seed, 42);
            }
            _ => panic!("expected snapshot"),
        }
    }
}
