//! The persisted governor state record.

use serde::{Deserialize, Serialize};

/// Single durable record shared by the stuck detector and cost governor.
///
/// Parsing is strict: a record with unknown or missing fields is treated as
/// corrupt rather than silently reinitialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopState {
    /// Iterations observed since the state was first created
    pub iteration: u64,
    /// Stuck-detection counters
    pub stuck: StuckState,
    /// Spend accumulated for the current period
    pub metrics: Metrics,
    /// Loop must not continue until an explicit reset
    pub paused: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StuckState {
    /// Consecutive iterations with negligible output and no file changes
    pub no_progress_count: u32,
    /// Length of the current run of identical errors
    pub same_error_repeats: u32,
    /// Fingerprint of the error that started the current run
    pub last_error_fingerprint: Option<String>,
}

impl StuckState {
    /// Zero both counters and forget the error fingerprint
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metrics {
    pub daily_cost: f64,
}
