//! Smart sun timer: an exposure countdown sized from advice.
//!
//! [`TimerState`] is the pure phase machine. [`SunTimer`] wraps it with an
//! advice provider, a session recorder and a Tokio ticker.

pub mod controller;
pub mod state;

pub use controller::{SunTimer, TimerEvent, TimerSnapshot, DEFAULT_TICK_INTERVAL};
pub use state::{TickOutcome, TimerPhase, TimerState};
