//! Pulser/worker simulation.
//!
//! One pulser thread drives a fresh clock while a pool of worker threads
//! each wait for a fixed number of ticks with their own cursor, checking
//! that every observation advances past the previous one.

use crossbeam_utils::sync::WaitGroup;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tick_clock::{Clock, Pulser};
use tick_common::config::SimulationConfig;
use tick_common::error::{ClockError, ClockResult};
use tick_common::metrics::WaitStats;
use tick_common::time::Tick;
use tracing::{debug, info, warn};

/// Outcome of a single worker.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    /// Worker index.
    pub id: usize,
    /// What the worker observed.
    pub stats: WaitStats,
    /// True if the worker observed all of its ticks without error.
    pub completed: bool,
    /// Failure description, if any.
    pub error: Option<String>,
}

/// Outcome of a whole simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Per-worker results, ordered by id.
    pub workers: Vec<WorkerReport>,
    /// Pulses emitted by the pulser.
    pub pulses: u64,
    /// Clock value after the run.
    pub final_tick: Tick,
    /// Wall time of the run in milliseconds.
    pub elapsed_ms: u64,
    /// True if every worker completed.
    pub passed: bool,
}

impl SimulationReport {
    /// Number of workers that completed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.workers.iter().filter(|w| w.completed).count()
    }

    /// Render a human-readable summary.
    #[must_use]
    pub fn render_text(&self, per_worker: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {}/{} workers completed, {} pulses, final tick {}, {} ms",
            if self.passed { "PASS" } else { "FAIL" },
            self.completed(),
            self.workers.len(),
            self.pulses,
            self.final_tick,
            self.elapsed_ms,
        );
        if per_worker {
            for w in &self.workers {
                let _ = write!(
                    out,
                    "  worker {:>3}: observed {:>4}, skipped {:>4}, max gap {:>3}, coverage {:>3.0}%, last {}",
                    w.id,
                    w.stats.observed,
                    w.stats.skipped,
                    w.stats.max_gap,
                    w.stats.coverage() * 100.0,
                    w.stats.last
                );
                if let Some(err) = &w.error {
                    let _ = write!(out, " ({err})");
                }
                out.push('\n');
            }
        }
        out
    }
}

/// Run a simulation on a fresh clock.
///
/// # Errors
///
/// Fails on invalid configuration, if a thread cannot be spawned, or if a
/// thread panics. Worker-level failures such as a non-monotonic tick are
/// recorded in the report instead.
pub fn run(config: &SimulationConfig) -> ClockResult<SimulationReport> {
    config.validate()?;
    if config.work_delay >= config.tick_interval {
        warn!(
            work_delay = ?config.work_delay,
            tick_interval = ?config.tick_interval,
            "Workers are slower than the pulser and will skip ticks"
        );
    }

    let clock = Arc::new(Clock::new());
    clock.initialize();
    let total_pulses = config.total_pulses();

    info!(
        workers = config.workers,
        ticks_per_worker = config.ticks_per_worker,
        total_pulses,
        "Starting simulation"
    );
    let started = Instant::now();

    let ready = WaitGroup::new();
    let mut handles = Vec::with_capacity(config.workers);
    for id in 0..config.workers {
        handles.push(spawn_worker(
            id,
            Arc::clone(&clock),
            ready.clone(),
            config.ticks_per_worker,
            Tick(total_pulses),
            config.work_delay,
        )?);
    }
    // Every worker is running before the first pulse
    ready.wait();
    debug!("All workers started");

    let mut pulser =
        Pulser::new(Arc::clone(&clock), config.tick_interval).with_limit(total_pulses);
    pulser.start()?;

    let mut workers = Vec::with_capacity(handles.len());
    for (id, handle) in handles.into_iter().enumerate() {
        let outcome = handle
            .join()
            .map_err(|_| ClockError::ThreadPanicked(worker_name(id)))?;
        workers.push(worker_report(id, outcome, config.ticks_per_worker));
    }
    let pulses = pulser.join()?;

    let report = SimulationReport {
        passed: workers.iter().all(|w| w.completed),
        workers,
        pulses,
        final_tick: clock.current(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(
        passed = report.passed,
        completed = report.completed(),
        pulses = report.pulses,
        "Simulation finished"
    );
    Ok(report)
}

fn worker_name(id: usize) -> String {
    format!("tick-worker-{id}")
}

type WorkerOutcome = (WaitStats, Option<ClockError>);

fn spawn_worker(
    id: usize,
    clock: Arc<Clock>,
    ready: WaitGroup,
    ticks: u64,
    final_tick: Tick,
    work_delay: Duration,
) -> ClockResult<JoinHandle<WorkerOutcome>> {
    let name = worker_name(id);
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            drop(ready);
            worker_loop(&clock, ticks, final_tick, work_delay)
        })
        .map_err(|e| ClockError::Spawn {
            name,
            reason: e.to_string(),
        })
}

/// Wait for `ticks` observations, stopping early once the final pulse is seen.
fn worker_loop(clock: &Clock, ticks: u64, final_tick: Tick, work_delay: Duration) -> WorkerOutcome {
    let mut stats = WaitStats::new();
    let mut cursor = Tick::ZERO;

    while stats.observed < ticks && cursor < final_tick {
        let tick = clock.wait_for_next_tick(&mut cursor);
        if let Err(e) = stats.record(tick) {
            return (stats, Some(e));
        }
        if !work_delay.is_zero() {
            thread::sleep(work_delay);
        }
    }
    (stats, None)
}

fn worker_report(id: usize, (stats, error): WorkerOutcome, ticks: u64) -> WorkerReport {
    let error = match error {
        Some(e) => Some(e.to_string()),
        None if stats.observed < ticks => Some(format!(
            "ran out of pulses after {} of {ticks} ticks",
            stats.observed
        )),
        None => None,
    };
    if let Some(err) = &error {
        warn!(worker = id, %err, "Worker failed");
    } else {
        debug!(worker = id, observed = stats.observed, skipped = stats.skipped, "Worker completed");
    }
    WorkerReport {
        id,
        completed: error.is_none(),
        stats,
        error,
    }
}
