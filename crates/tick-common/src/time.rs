//! Logical tick values.
//!
//! A tick carries no wall-clock meaning; the only property that matters
//! is its ordering relative to other ticks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value of the shared logical counter.
///
/// Also used as the consumer cursor: the highest tick a consumer has seen.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    /// The value before any pulse has occurred.
    pub const ZERO: Tick = Tick(0);

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The tick immediately after this one, or `None` if the counter is exhausted.
    #[must_use]
    pub fn next(self) -> Option<Tick> {
        self.0.checked_add(1).map(Tick)
    }

    /// Number of ticks between `earlier` and `self` (zero if `earlier` is not earlier).
    #[must_use]
    pub fn distance_from(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
