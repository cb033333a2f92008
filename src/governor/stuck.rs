//! Stuck detection: no forward progress, or the same failure over and over.
//!
//! Two independent counters live in `LoopState::stuck`. Each call to
//! `record_iteration` updates both, persists them, and pauses the loop when
//! either reaches its threshold.

use std::sync::Arc;

use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::config::StuckConfig;
use crate::domain::{IterationSignal, LoopState, PauseReason};
use crate::error::Result;
use crate::escalation::EscalationChannel;
use crate::storage::StateStore;

/// Stable fingerprint of an error message.
///
/// The raw text is hashed as-is. Messages that embed timestamps or request
/// IDs therefore never repeat.
pub fn fingerprint(error: &str) -> String {
    hex::encode(Sha256::digest(error.as_bytes()))
}

/// Fold one iteration's signal into the state.
///
/// Returns every threshold that fired, in evaluation order (no-progress
/// first, then same-error). Sets `paused` if any fired and never clears it.
pub fn apply_signal(state: &mut LoopState, signal: &IterationSignal, config: &StuckConfig) -> Vec<PauseReason> {
    let stuck = &mut state.stuck;
    state.iteration = state.iteration.saturating_add(1);

    if signal.is_no_progress(config.min_tokens) {
        stuck.no_progress_count = stuck.no_progress_count.saturating_add(1);
    } else {
        stuck.no_progress_count = 0;
    }

    match &signal.error {
        Some(text) => {
            let print = fingerprint(text);
            if stuck.last_error_fingerprint.as_deref() == Some(print.as_str()) {
                stuck.same_error_repeats = stuck.same_error_repeats.saturating_add(1);
            } else {
                stuck.same_error_repeats = 1;
                stuck.last_error_fingerprint = Some(print);
            }
        }
        None => {
            stuck.same_error_repeats = 0;
            stuck.last_error_fingerprint = None;
        }
    }

    let mut fired = Vec::new();
    if stuck.no_progress_count >= config.no_progress_threshold {
        fired.push(PauseReason::NoProgress {
            iterations: stuck.no_progress_count,
        });
    }
    if let Some(text) = &signal.error {
        if stuck.same_error_repeats >= config.same_error_threshold {
            fired.push(PauseReason::RepeatedError {
                error: text.clone(),
                repeats: stuck.same_error_repeats,
            });
        }
    }

    if !fired.is_empty() {
        state.paused = true;
    }
    fired
}

/// Result of recording one iteration.
#[derive(Debug, Clone)]
pub struct IterationOutcome {
    /// State as persisted after this iteration
    pub state: LoopState,
    /// Reason written to the escalation notice, if a threshold fired
    pub reason: Option<PauseReason>,
}

impl IterationOutcome {
    pub fn paused(&self) -> bool {
        self.state.paused
    }
}

pub struct StuckDetector {
    store: Arc<dyn StateStore>,
    escalation: Arc<dyn EscalationChannel>,
    config: StuckConfig,
}

impl StuckDetector {
    pub fn new(store: Arc<dyn StateStore>, escalation: Arc<dyn EscalationChannel>, config: StuckConfig) -> Self {
        Self {
            store,
            escalation,
            config,
        }
    }

    /// Validate raw driver input, then record it.
    ///
    /// Negative values fail with `InvalidSignal` before the state is touched.
    pub fn record(&self, tokens: i64, file_changes: i64, error: Option<String>) -> Result<IterationOutcome> {
        let signal = IterationSignal::new(tokens, file_changes, error)?;
        self.record_iteration(&signal)
    }

    /// Record one iteration and persist the updated counters.
    ///
    /// When both conditions fire in the same call only the last evaluated
    /// reason (same-error) reaches the notice.
    pub fn record_iteration(&self, signal: &IterationSignal) -> Result<IterationOutcome> {
        let mut state = self.store.get()?;
        let fired = apply_signal(&mut state, signal, &self.config);

        debug!(
            "Iteration {}: tokens={} file_changes={} no_progress={} same_error={}",
            state.iteration,
            signal.tokens,
            signal.file_changes,
            state.stuck.no_progress_count,
            state.stuck.same_error_repeats
        );

        if fired.len() > 1 {
            for dropped in &fired[..fired.len() - 1] {
                warn!("Multiple stuck conditions fired, notice omits: {}", dropped);
            }
        }
        let reason = fired.into_iter().last();

        // Notice goes out before the state so a failed write still leaves the loop blocked
        if let Some(reason) = &reason {
            info!("Pausing loop at iteration {}: {}", state.iteration, reason);
            self.escalation.write(&reason.to_string())?;
        }
        self.store.put(&state)?;

        Ok(IterationOutcome { state, reason })
    }
}
