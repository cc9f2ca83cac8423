//! Shared logical clock.
//!
//! One guarded counter plus a broadcast wake-up. Producers call
//! [`Clock::pulse`] to advance the counter; consumers call
//! [`Clock::wait_for_next_tick`] with a private cursor and block until the
//! counter moves past it.
//!
//! Consumers observe the latest tick, not every tick: a consumer that is
//! busy while several pulses happen wakes up once and sees the newest value.
//!
//! # Lifecycle
//!
//! A clock starts UNINITIALIZED. [`Clock::initialize`] brings it to READY and
//! is idempotent. [`Clock::destroy`] returns it to UNINITIALIZED. Pulses and
//! waits bring the clock up on their own, so a destroyed clock revives on the
//! next use with its generation bumped. The counter is never reset: it starts
//! at zero on construction and keeps its value across destroy and revive, so
//! cursors taken before a destroy stay valid afterwards.

use crossbeam_utils::CachePadded;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tick_common::state::{ClockState, Lifecycle};
use tick_common::time::Tick;
use tracing::{debug, info, trace, warn};

/// State guarded by the clock lock.
#[derive(Debug)]
struct ClockInner {
    /// Current counter value.
    tick: Tick,
    /// UNINITIALIZED / READY tracking.
    lifecycle: Lifecycle,
    /// Consumers currently parked on the condition variable.
    waiters: usize,
}

/// Point-in-time view of a clock, read under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    /// Counter value.
    pub tick: Tick,
    /// Lifecycle state.
    pub state: ClockState,
    /// Consumers blocked in `wait_for_next_tick`.
    pub waiters: usize,
    /// Number of times the clock has been initialized.
    pub generation: u64,
    /// Effective initialize and destroy calls so far.
    pub transitions: u64,
}

/// A monotonically increasing tick counter with broadcast wake-up.
///
/// Share it between threads with `Arc<Clock>`, or use the process-wide
/// instance in [`crate::global`].
#[derive(Debug)]
pub struct Clock {
    inner: CachePadded<Mutex<ClockInner>>,
    advanced: Condvar,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a clock in the UNINITIALIZED state.
    ///
    /// Usable in a `static`; nothing is set up until the first call to
    /// `initialize`, `pulse` or `wait_for_next_tick`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: CachePadded::new(Mutex::new(ClockInner {
                tick: Tick::ZERO,
                lifecycle: Lifecycle::new(),
                waiters: 0,
            })),
            advanced: Condvar::new(),
        }
    }

    /// Lock the clock state.
    ///
    /// Every critical section leaves the counter consistent, so a lock
    /// poisoned by a panicking thread is still safe to use.
    fn lock(&self) -> MutexGuard<'_, ClockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bring the clock to READY if it is not already. Caller holds the lock.
    fn ensure_ready(inner: &mut ClockInner, caller: &'static str) {
        if inner.lifecycle.state().is_ready() {
            return;
        }
        inner.lifecycle.initialize();
        let generation = inner.lifecycle.generation();
        if generation > 1 {
            warn!(
                generation,
                caller,
                tick = inner.tick.get(),
                "Clock revived after destroy"
            );
        } else {
            info!(caller, "Clock initialized");
        }
    }

    /// Ensure the clock is READY.
    ///
    /// The counter is zero after construction and is never reset, so a
    /// revived clock continues from where it was destroyed.
    ///
    /// Safe to call any number of times from any number of threads; only the
    /// first call after construction or `destroy` performs the setup.
    pub fn initialize(&self) {
        let mut inner = self.lock();
        Self::ensure_ready(&mut inner, "initialize");
    }

    /// Return the clock to UNINITIALIZED.
    ///
    /// A no-op if the clock was never initialized or is already destroyed.
    /// Calling `pulse` or `wait_for_next_tick` afterwards revives the clock.
    pub fn destroy(&self) {
        let mut inner = self.lock();
        if inner.lifecycle.destroy() {
            info!(
                tick = inner.tick.get(),
                waiters = inner.waiters,
                transitions = inner.lifecycle.transition_count(),
                "Clock destroyed"
            );
        } else {
            debug!("Clock destroy ignored, not initialized");
        }
    }

    /// Advance the counter by one and wake every blocked consumer.
    ///
    /// Concurrent pulses are serialized by the clock lock and each one counts.
    /// Returns the new tick.
    ///
    /// # Panics
    ///
    /// Panics if the counter would pass `u64::MAX`.
    pub fn pulse(&self) -> Tick {
        let mut inner = self.lock();
        Self::ensure_ready(&mut inner, "pulse");

        let Some(next) = inner.tick.next() else {
            panic!("tick counter exhausted at {}", inner.tick);
        };
        inner.tick = next;
        self.advanced.notify_all();

        trace!(tick = next.get(), waiters = inner.waiters, "Pulse");
        next
    }

    /// Block until the counter is strictly greater than `cursor`.
    ///
    /// On return `cursor` holds the new tick, which is also returned. Ticks
    /// that happened while the caller was not waiting are not replayed: the
    /// newest value is returned and the intermediate ones are skipped.
    ///
    /// There is no timeout. If no producer pulses again this blocks forever.
    pub fn wait_for_next_tick(&self, cursor: &mut Tick) -> Tick {
        let last = *cursor;
        let mut inner = self.lock();
        Self::ensure_ready(&mut inner, "wait_for_next_tick");

        if inner.tick <= last {
            inner.waiters += 1;
            inner = self
                .advanced
                .wait_while(inner, |state| state.tick <= last)
                .unwrap_or_else(PoisonError::into_inner);
            inner.waiters -= 1;
        }

        let tick = inner.tick;
        *cursor = tick;
        trace!(last = last.get(), tick = tick.get(), "Tick observed");
        tick
    }

    /// Current counter value.
    #[must_use]
    pub fn current(&self) -> Tick {
        self.lock().tick
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ClockState {
        self.lock().lifecycle.state()
    }

    /// Read tick, state, waiter count and lifecycle counters in one critical section.
    #[must_use]
    pub fn snapshot(&self) -> ClockSnapshot {
        let inner = self.lock();
        ClockSnapshot {
            tick: inner.tick,
            state: inner.lifecycle.state(),
            waiters: inner.waiters,
            generation: inner.lifecycle.generation(),
            transitions: inner.lifecycle.transition_count(),
        }
    }
}
