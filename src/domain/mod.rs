//! Domain types for loopguard
//!
//! - LoopState: the persisted governor record (counters, spend, paused flag)
//! - IterationSignal: per-iteration input from the driver
//! - SecurityEvent: sandbox audit entries
//! - PauseReason: which threshold paused the loop

pub mod event;
pub mod reason;
pub mod signal;
pub mod state;

pub use event::{OUTSIDE_ROOT_REASON, SANDBOX_VIOLATION, SecurityEvent, SecurityLog};
pub use reason::PauseReason;
pub use signal::IterationSignal;
pub use state::{LoopState, Metrics, StuckState};
