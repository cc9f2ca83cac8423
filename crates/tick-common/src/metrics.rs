//! Consumer-side observation statistics.
//!
//! Consumers see the latest tick, not every tick. `WaitStats` records what a
//! single consumer actually observed, including how many intermediate ticks
//! it skipped because it was busy when they happened.

use crate::error::{ClockError, ClockResult};
use crate::time::Tick;
use serde::{Deserialize, Serialize};

/// Observation statistics for one consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitStats {
    /// Number of ticks observed.
    pub observed: u64,
    /// First tick observed, if any.
    pub first: Option<Tick>,
    /// Most recent tick observed.
    pub last: Tick,
    /// Intermediate ticks never individually observed.
    pub skipped: u64,
    /// Largest single gap between consecutive observations.
    pub max_gap: u64,
}

impl WaitStats {
    /// Create empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick returned by a wait.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NonMonotonic`] if `tick` does not advance past the
    /// previous observation. The statistics are left unchanged in that case.
    pub fn record(&mut self, tick: Tick) -> ClockResult<()> {
        if tick <= self.last {
            return Err(ClockError::NonMonotonic {
                previous: self.last,
                observed: tick,
            });
        }

        let gap = tick.distance_from(self.last);
        self.skipped += gap - 1;
        self.max_gap = self.max_gap.max(gap);
        self.first.get_or_insert(tick);
        self.last = tick;
        self.observed += 1;
        Ok(())
    }

    /// Fraction of elapsed ticks that were individually observed (1.0 = none skipped).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        let seen = self.observed + self.skipped;
        if seen == 0 {
            return 1.0;
        }
        self.observed as f64 / seen as f64
    }
}
