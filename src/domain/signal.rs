//! Per-iteration signal reported by the driver.

use crate::error::{GovernorError, Result};

/// Measured outcome of one agent iteration. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSignal {
    /// Output tokens the agent produced
    pub tokens: u64,
    /// Files the agent changed in the repository
    pub file_changes: u64,
    /// Error text, if the iteration failed
    pub error: Option<String>,
}

impl IterationSignal {
    /// Validate raw driver input.
    ///
    /// Negative values are rejected with `InvalidSignal`. An empty error string
    /// counts as no error.
    pub fn new(tokens: i64, file_changes: i64, error: Option<String>) -> Result<Self> {
        let tokens = u64::try_from(tokens)
            .map_err(|_| GovernorError::InvalidSignal(format!("tokens must be >= 0, got {}", tokens)))?;
        let file_changes = u64::try_from(file_changes).map_err(|_| {
            GovernorError::InvalidSignal(format!("file_changes must be >= 0, got {}", file_changes))
        })?;
        Ok(Self {
            tokens,
            file_changes,
            error: error.filter(|e| !e.is_empty()),
        })
    }

    /// Negligible output and nothing touched on disk
    pub fn is_no_progress(&self, min_tokens: u64) -> bool {
        self.tokens < min_tokens && self.file_changes == 0
    }
}
