#![doc = "Shared logical clock: one producer-advanced tick counter that any number of consumers block on."]

pub mod clock;
pub mod global;
pub mod pulser;

pub use clock::*;
pub use pulser::*;
pub use tick_common::{ClockError, ClockResult, ClockState, Tick};
