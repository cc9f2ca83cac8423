//! Simulation entry point.
//!
//! Runs a pulser against a pool of workers sharing one clock and reports
//! whether every worker observed a strictly increasing sequence of ticks.

mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tick_common::config::{ReportFormat, SimulationConfig};
use tracing::{info, warn};

/// Simulation command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tick-sim",
    about = "Drive a shared logical clock with a pulser and concurrent workers",
    version,
    long_about = None
)]
struct Args {
    /// Path to a simulation configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of worker threads (overrides config file).
    #[arg(long, short = 'w')]
    workers: Option<usize>,

    /// Ticks each worker waits for (overrides config file).
    #[arg(long, short = 't')]
    ticks: Option<u64>,

    /// Delay between pulses, e.g. "20ms" (overrides config file).
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Emit the report as JSON.
    #[arg(long)]
    json: bool,

    /// Print one line per worker in text output.
    #[arg(long)]
    per_worker: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting tick simulation");

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid simulation configuration")?;

    info!(
        workers = config.workers,
        ticks_per_worker = config.ticks_per_worker,
        ?config.tick_interval,
        "Configuration loaded"
    );

    let report = simulation::run(&config).context("Simulation failed to run")?;

    match config.report.format {
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
        ReportFormat::Text => print!("{}", report.render_text(config.report.per_worker)),
    }

    if !report.passed {
        anyhow::bail!(
            "{} of {} workers failed",
            report.workers.len() - report.completed(),
            report.workers.len()
        );
    }
    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("tick_sim={level},tick_clock={level},tick_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `TICKCLOCK_CONFIG_PATH` environment variable
/// 3. `config/default.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<SimulationConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return SimulationConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("TICKCLOCK_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from TICKCLOCK_CONFIG_PATH");
            return SimulationConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from TICKCLOCK_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(
            path = %env_path,
            "TICKCLOCK_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return SimulationConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    info!("No config file found, using built-in defaults");
    Ok(SimulationConfig::default())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ticks) = args.ticks {
        config.ticks_per_worker = ticks;
    }
    if let Some(interval) = args.interval {
        config.tick_interval = interval;
    }
    if args.json {
        config.report.format = ReportFormat::Json;
    }
    if args.per_worker {
        config.report.per_worker = true;
    }
}
