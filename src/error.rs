//! Error types for loopguard
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur in the governor
#[derive(Debug, Error)]
pub enum GovernorError {
    /// Backing store is unreadable or holds data that does not parse
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed iteration signal from the driver
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    /// Malformed cost amount from the driver
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Path falls outside the containment root
    #[error("Sandbox denied {}: {}", .path.display(), .reason)]
    SandboxDenied { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GovernorError {
    /// Whether this is the sandbox's normal denial rather than an internal fault
    pub fn is_denial(&self) -> bool {
        matches!(self, GovernorError::SandboxDenied { .. })
    }
}

/// Result type alias for governor operations
pub type Result<T> = std::result::Result<T, GovernorError>;
