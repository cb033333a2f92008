//! The per-iteration safety governor.
//!
//! `Governor` wires the stuck detector, cost governor and sandbox guard to
//! one shared state store, escalation channel and security log. The driver
//! calls it once per iteration and stops as soon as `paused` is set.
//!
//! Every mutation is a whole-record read-modify-write. Nothing locks the
//! state between processes; the driver must not overlap iterations or run
//! two governors against the same state directory at once.

mod cost;
mod stuck;

use std::sync::Arc;

use log::info;

pub use self::cost::{CostGovernor, CostOutcome};
pub use self::stuck::{IterationOutcome, StuckDetector, apply_signal, fingerprint};
use crate::config::GovernorConfig;
use crate::domain::{LoopState, PauseReason};
use crate::error::Result;
use crate::escalation::{EscalationChannel, MemoryNotice, NoticeFile};
use crate::sandbox::SandboxGuard;
use crate::storage::{EventLog, JsonEventLog, JsonStateStore, MemoryEventLog, MemoryStateStore, StateStore};

pub struct Governor {
    store: Arc<dyn StateStore>,
    escalation: Arc<dyn EscalationChannel>,
    stuck: StuckDetector,
    cost: CostGovernor,
    sandbox: SandboxGuard,
}

impl Governor {
    /// Build a governor from injected stores.
    pub fn new(
        config: &GovernorConfig,
        store: Arc<dyn StateStore>,
        escalation: Arc<dyn EscalationChannel>,
        events: Arc<dyn EventLog>,
    ) -> Result<Self> {
        let root = config.sandbox.resolve_root()?;
        Ok(Self {
            stuck: StuckDetector::new(store.clone(), escalation.clone(), config.stuck.clone()),
            cost: CostGovernor::new(store.clone(), escalation.clone(), config.budget.daily),
            sandbox: SandboxGuard::new(root, events)?,
            store,
            escalation,
        })
    }

    /// Governor persisting to the files under `config.state_dir`.
    pub fn open(config: &GovernorConfig) -> Result<Self> {
        let dir = &config.state_dir;
        Self::new(
            config,
            Arc::new(JsonStateStore::in_dir(dir)),
            Arc::new(NoticeFile::in_dir(dir)),
            Arc::new(JsonEventLog::in_dir(dir)),
        )
    }

    /// Governor with nothing written to disk.
    pub fn in_memory(config: &GovernorConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(MemoryStateStore::new()),
            Arc::new(MemoryNotice::new()),
            Arc::new(MemoryEventLog::new()),
        )
    }

    pub fn stuck(&self) -> &StuckDetector {
        &self.stuck
    }

    pub fn cost(&self) -> &CostGovernor {
        &self.cost
    }

    pub fn sandbox(&self) -> &SandboxGuard {
        &self.sandbox
    }

    /// Current state. Does not write.
    pub fn status(&self) -> Result<LoopState> {
        self.store.get()
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.store.get()?.paused)
    }

    /// Current escalation notice text, if the loop is blocked on input.
    pub fn notice(&self) -> Result<Option<String>> {
        self.escalation.read()
    }

    /// Zero the stuck counters, lift the pause and withdraw the notice.
    ///
    /// Spend and the iteration count are kept. While spend is still at or
    /// over the budget the loop stays paused and the notice is rewritten with
    /// the budget reason; only `cost().reset()` lifts that pause.
    pub fn reset(&self) -> Result<LoopState> {
        let mut state = self.store.get()?;
        state.stuck.clear();

        let budget = self.cost.budget();
        let total = state.metrics.daily_cost;
        if total >= budget {
            let reason = PauseReason::BudgetReached { budget, total };
            state.paused = true;
            self.escalation.write(&reason.to_string())?;
            self.store.put(&state)?;
            info!("Governor reset at iteration {}, still paused: {}", state.iteration, reason);
        } else {
            state.paused = false;
            self.store.put(&state)?;
            self.escalation.clear()?;
            info!("Governor reset at iteration {}", state.iteration);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(root: &std::path::Path, budget: f64) -> GovernorConfig {
        let mut config = GovernorConfig::default();
        config.sandbox.root = Some(root.to_path_buf());
        config.budget.daily = budget;
        config
    }

    #[test]
    fn test_status_twice_identical() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 10.0)).unwrap();
        governor.stuck().record(10, 0, Some("x".to_string())).unwrap();
        assert_eq!(governor.status().unwrap(), governor.status().unwrap());
    }

    #[test]
    fn test_fresh_state_five_no_progress() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 10.0)).unwrap();
        for _ in 0..5 {
            governor.stuck().record(50, 0, None).unwrap();
        }
        let state = governor.status().unwrap();
        assert_eq!(state.stuck.no_progress_count, 5);
        assert!(state.paused);
        assert!(governor.notice().unwrap().is_some());
    }

    #[test]
    fn test_reset_lifts_pause_keeps_cost() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 10.0)).unwrap();
        governor.cost().add(1.5).unwrap();
        for _ in 0..5 {
            governor.stuck().record(0, 0, Some("same".to_string())).unwrap();
        }
        assert!(governor.is_paused().unwrap());

        let state = governor.reset().unwrap();
        assert!(!state.paused);
        assert_eq!(state.stuck.no_progress_count, 0);
        assert_eq!(state.stuck.same_error_repeats, 0);
        assert!(state.stuck.last_error_fingerprint.is_none());
        assert_eq!(state.metrics.daily_cost, 1.5);
        assert_eq!(state.iteration, 5);
        assert!(governor.notice().unwrap().is_none());
    }

    #[test]
    fn test_cost_reset_lifts_budget_pause() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 1.0)).unwrap();
        assert!(governor.cost().add(1.0).unwrap().paused);
        assert!(governor.notice().unwrap().is_some());

        governor.cost().reset().unwrap();
        assert!(!governor.is_paused().unwrap());
        assert!(governor.notice().unwrap().is_none());
    }

    #[test]
    fn test_budget_pause_survives_stuck_progress() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 1.0)).unwrap();
        governor.cost().add(2.0).unwrap();
        let outcome = governor.stuck().record(5000, 3, None).unwrap();
        assert!(outcome.paused());
    }

    #[test]
    fn test_reset_keeps_budget_pause() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 5.0)).unwrap();
        governor.cost().add(6.0).unwrap();
        for _ in 0..3 {
            governor.stuck().record(0, 0, Some("quota".to_string())).unwrap();
        }

        let state = governor.reset().unwrap();
        assert!(state.paused);
        assert_eq!(state.stuck.same_error_repeats, 0);
        assert_eq!(state.metrics.daily_cost, 6.0);
        let notice = governor.notice().unwrap().unwrap();
        assert!(notice.contains("Daily budget of $5.00 reached"));
        assert!(!notice.contains("quota"));

        let outcome = governor.stuck().record(5000, 3, None).unwrap();
        assert!(outcome.paused());

        governor.cost().reset().unwrap();
        assert!(!governor.is_paused().unwrap());
        assert!(governor.notice().unwrap().is_none());
    }

    #[test]
    fn test_sandbox_independent_of_pause() {
        let temp = TempDir::new().unwrap();
        let governor = Governor::in_memory(&config(temp.path(), 1.0)).unwrap();
        governor.cost().add(5.0).unwrap();
        assert!(governor.sandbox().check_path(temp.path().join("file.txt")).is_ok());
        assert!(governor.sandbox().check_path("/etc/passwd").is_err());
        assert!(governor.is_paused().unwrap());
        assert_eq!(governor.sandbox().list_violations().unwrap().len(), 1);
    }

    #[test]
    fn test_open_persists_to_state_dir() {
        let temp = TempDir::new().unwrap();
        let mut config = config(temp.path(), 10.0);
        config.state_dir = temp.path().join("state");

        {
            let governor = Governor::open(&config).unwrap();
            governor.stuck().record(10, 0, None).unwrap();
            governor.cost().add(0.25).unwrap();
        }

        let governor = Governor::open(&config).unwrap();
        let state = governor.status().unwrap();
        assert_eq!(state.iteration, 1);
        assert_eq!(state.stuck.no_progress_count, 1);
        assert_eq!(state.metrics.daily_cost, 0.25);
    }
}
