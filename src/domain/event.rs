//! Security audit events written by the sandbox guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kind recorded for a path outside the containment root
pub const SANDBOX_VIOLATION: &str = "sandbox_violation";

/// Reason recorded with every sandbox violation
pub const OUTSIDE_ROOT_REASON: &str = "outside working directory";

/// One entry in the append-only security log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    #[serde(rename = "event")]
    pub event_kind: String,
    /// Path exactly as the caller supplied it
    pub path: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(event_kind: &str, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            event_kind: event_kind.to_string(),
            path: path.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a sandbox_violation event
    pub fn sandbox_violation(path: impl Into<String>) -> Self {
        Self::new(SANDBOX_VIOLATION, path, OUTSIDE_ROOT_REASON)
    }
}

/// On-disk document holding the security log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityLog {
    pub security_events: Vec<SecurityEvent>,
}
