//! Periodic producer thread.
//!
//! A `Pulser` owns a thread that pulses a shared clock at a fixed interval,
//! either for a bounded number of pulses or until stopped. Deadlines are
//! absolute (`next = previous + interval`) so sleep overshoot does not
//! accumulate into drift.
//!
//! The interval is a pacing aid for producers only. Ticks carry no
//! wall-clock meaning and consumers must not assume any rate.

use crate::clock::Clock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tick_common::error::{ClockError, ClockResult};
use tracing::{debug, info, warn};

const THREAD_NAME: &str = "tick-pulser";

/// Shared state between the owner and the pulser thread.
#[derive(Debug, Default)]
struct PulserState {
    /// Set to ask the thread to exit at its next wake-up.
    stop_requested: AtomicBool,
    /// Pulses emitted since the last start.
    emitted: AtomicU64,
}

/// Background thread that pulses a clock periodically.
#[derive(Debug)]
pub struct Pulser {
    clock: Arc<Clock>,
    interval: Duration,
    limit: Option<u64>,
    state: Arc<PulserState>,
    handle: Option<JoinHandle<()>>,
}

impl Pulser {
    /// Create a stopped pulser that will pulse `clock` every `interval`.
    pub fn new(clock: Arc<Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            limit: None,
            state: Arc::new(PulserState::default()),
            handle: None,
        }
    }

    /// Stop on its own after emitting `pulses` pulses.
    #[must_use]
    pub fn with_limit(mut self, pulses: u64) -> Self {
        self.limit = Some(pulses);
        self
    }

    /// Spawn the pulser thread.
    ///
    /// The first pulse happens one interval after start.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::AlreadyRunning`] if a previous run has not been
    /// stopped or joined, or [`ClockError::Spawn`] if the thread cannot be
    /// spawned.
    pub fn start(&mut self) -> ClockResult<()> {
        if self.handle.is_some() {
            return Err(ClockError::AlreadyRunning(THREAD_NAME.into()));
        }

        info!(
            interval_ms = self.interval.as_millis(),
            limit = ?self.limit,
            "Starting pulser"
        );

        self.state.stop_requested.store(false, Ordering::Release);
        self.state.emitted.store(0, Ordering::Release);

        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);
        let interval = self.interval;
        let limit = self.limit;

        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || pulse_loop(&clock, &state, interval, limit))
            .map_err(|e| ClockError::Spawn {
                name: THREAD_NAME.into(),
                reason: e.to_string(),
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Ask the thread to stop and wait for it. Returns pulses emitted.
    ///
    /// Stopping a pulser that is not running returns the last count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ThreadPanicked`] if the pulser thread panicked.
    pub fn stop(&mut self) -> ClockResult<u64> {
        if let Some(handle) = &self.handle {
            debug!("Stopping pulser");
            self.state.stop_requested.store(true, Ordering::Release);
            handle.thread().unpark();
        }
        self.join()
    }

    /// Wait for the thread to finish on its own. Returns pulses emitted.
    ///
    /// Without a limit this only returns after `stop` is requested from
    /// elsewhere, so bounded pulsers are the intended use.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::ThreadPanicked`] if the pulser thread panicked.
    pub fn join(&mut self) -> ClockResult<u64> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| ClockError::ThreadPanicked(THREAD_NAME.into()))?;
        }
        Ok(self.emitted())
    }

    /// Check if the pulser thread is still emitting.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Pulses emitted since the last start.
    pub fn emitted(&self) -> u64 {
        self.state.emitted.load(Ordering::Acquire)
    }
}

impl Drop for Pulser {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Pulser shutdown failed: {e}");
        }
    }
}

fn pulse_loop(clock: &Clock, state: &PulserState, interval: Duration, limit: Option<u64>) {
    debug!("Pulser thread started");
    let mut deadline = Instant::now() + interval;

    while limit.map_or(true, |max| state.emitted.load(Ordering::Acquire) < max) {
        if !sleep_until(deadline, state) {
            break;
        }
        clock.pulse();
        state.emitted.fetch_add(1, Ordering::AcqRel);
        deadline += interval;
    }

    debug!(
        emitted = state.emitted.load(Ordering::Acquire),
        "Pulser thread stopped"
    );
}

/// Park until `deadline`. Returns `false` if a stop was requested first.
fn sleep_until(deadline: Instant, state: &PulserState) -> bool {
    loop {
        if state.stop_requested.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}
