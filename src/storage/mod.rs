//! Storage layer for loopguard.
//!
//! The governor owns two durable resources: the loop state record and the
//! security log. Both sit behind traits so components can be handed either
//! the JSON-file implementations or the in-memory ones.

mod json;
mod memory;
mod traits;

pub use json::{JsonEventLog, JsonStateStore, SECURITY_LOG_FILE, STATE_FILE};
pub(crate) use json::write_atomic;
pub use memory::{MemoryEventLog, MemoryStateStore};
pub use traits::{EventLog, StateStore};
