use crate::time::Tick;
use thiserror::Error;

/// Clock error types covering consumer misuse, lifecycle faults, and simulation failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockError {
    /// A wait was requested without a cursor to record the observed tick in.
    #[error("wait requested without a cursor")]
    MissingCursor,

    /// A consumer observed a tick that did not advance past its previous observation.
    #[error("non-monotonic tick: previous {previous}, observed {observed}")]
    NonMonotonic {
        /// Last tick the consumer had observed.
        previous: Tick,
        /// Tick returned by the offending wait.
        observed: Tick,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background thread was started while a previous run is still alive.
    #[error("{0} already running")]
    AlreadyRunning(String),

    /// A producer or consumer thread could not be spawned.
    #[error("failed to spawn thread {name}: {reason}")]
    Spawn {
        /// Thread name.
        name: String,
        /// OS error description.
        reason: String,
    },

    /// A producer or consumer thread panicked.
    #[error("thread {0} panicked")]
    ThreadPanicked(String),

    /// Invalid lifecycle transition attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

/// Convenience type alias for clock operations.
pub type ClockResult<T> = Result<T, ClockError>;
