//! Storage trait definitions.
//!
//! Components receive their stores explicitly so tests can substitute the
//! in-memory implementations.

use crate::domain::{LoopState, SecurityEvent};
use crate::error::Result;

/// Whole-record store for the governor state.
///
/// Callers perform read-modify-write cycles and assume a single writer at a
/// time. Nothing here locks across processes.
pub trait StateStore: Send + Sync {
    /// Current state, or zeroed defaults if none has been written yet.
    fn get(&self) -> Result<LoopState>;

    /// Atomically replace the whole record.
    fn put(&self, state: &LoopState) -> Result<()>;
}

/// Append-only log of security events.
pub trait EventLog: Send + Sync {
    /// Append one event to the end of the log.
    fn append(&self, event: &SecurityEvent) -> Result<()>;

    /// All events in insertion order.
    fn list(&self) -> Result<Vec<SecurityEvent>>;
}
