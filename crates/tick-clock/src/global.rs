//! Process-wide default clock.
//!
//! For code that needs a single tick source reachable from anywhere without
//! threading an `Arc<Clock>` through. The instance is built at compile time,
//! so there is no first-use race to guard. Tests and components that want
//! isolation should construct their own [`Clock`] instead.

use crate::clock::Clock;
use tick_common::error::{ClockError, ClockResult};
use tick_common::time::Tick;

static CLOCK: Clock = Clock::new();

/// The process-wide clock.
#[must_use]
pub fn clock() -> &'static Clock {
    &CLOCK
}

/// Initialize the process-wide clock. Idempotent.
pub fn initialize() {
    CLOCK.initialize();
}

/// Destroy the process-wide clock. A no-op if it is not initialized.
pub fn destroy() {
    CLOCK.destroy();
}

/// Pulse the process-wide clock, returning the new tick.
pub fn pulse() -> Tick {
    CLOCK.pulse()
}

/// Wait on the process-wide clock for a tick newer than `cursor`.
///
/// # Errors
///
/// Returns [`ClockError::MissingCursor`] without blocking if `cursor` is `None`.
pub fn wait_tick(cursor: Option<&mut Tick>) -> ClockResult<Tick> {
    let cursor = cursor.ok_or(ClockError::MissingCursor)?;
    Ok(CLOCK.wait_for_next_tick(cursor))
}
