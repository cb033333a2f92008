//! In-memory stores for tests and embedding.

use std::sync::Mutex;

use super::traits::{EventLog, StateStore};
use crate::domain::{LoopState, SecurityEvent};
use crate::error::{GovernorError, Result};

/// State store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<LoopState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_state(state: LoopState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self) -> Result<LoopState> {
        let state = self.state.lock().map_err(|e| GovernorError::Storage(e.to_string()))?;
        Ok(state.clone().unwrap_or_default())
    }

    fn put(&self, state: &LoopState) -> Result<()> {
        let mut slot = self.state.lock().map_err(|e| GovernorError::Storage(e.to_string()))?;
        *slot = Some(state.clone());
        Ok(())
    }
}

/// Event log held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: &SecurityEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|e| GovernorError::Storage(e.to_string()))?
            .push(event.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<SecurityEvent>> {
        Ok(self
            .events
            .lock()
            .map_err(|e| GovernorError::Storage(e.to_string()))?
            .clone())
    }
}
