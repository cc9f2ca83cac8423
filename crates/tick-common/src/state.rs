//! Lifecycle state machine for a shared clock.
//!
//! A clock cycles between two states:
//! UNINITIALIZED → READY → UNINITIALIZED → ...
//!
//! There is no terminal state; a destroyed clock may be brought up again.

use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockState {
    /// Not yet set up, or torn down by `destroy`.
    #[default]
    Uninitialized,
    /// Counter is live; pulses and waits operate normally.
    Ready,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Ready => write!(f, "READY"),
        }
    }
}

impl ClockState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: ClockState) -> bool {
        matches!(
            (self, target),
            (Self::Uninitialized, Self::Ready) | (Self::Ready, Self::Uninitialized)
        )
    }

    /// Attempt to transition to `target`, returning error if invalid.
    pub fn transition_to(&mut self, target: ClockState) -> ClockResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(ClockError::InvalidStateTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns true if the clock accepts pulses and waits without setup.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Lifecycle tracker with generation counting.
///
/// `initialize` and `destroy` are idempotent: calling either in the state
/// it would produce is a no-op that reports `false`.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    current: ClockState,
    generation: u64,
    transition_count: u64,
}

impl Lifecycle {
    /// Create a lifecycle in UNINITIALIZED.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: ClockState::Uninitialized,
            generation: 0,
            transition_count: 0,
        }
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> ClockState {
        self.current
    }

    /// Number of times the clock has been brought up.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total number of effective transitions.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Move to READY. Returns `true` if this call performed the setup.
    pub fn initialize(&mut self) -> bool {
        if self.current.transition_to(ClockState::Ready).is_err() {
            return false;
        }
        self.generation += 1;
        self.transition_count += 1;
        true
    }

    /// Move to UNINITIALIZED. Returns `true` if this call performed the teardown.
    pub fn destroy(&mut self) -> bool {
        if self.current.transition_to(ClockState::Uninitialized).is_err() {
            return false;
        }
        self.transition_count += 1;
        true
    }
}
