//! Cost ceiling for the current budget period.
//!
//! Spend accumulates in `LoopState::metrics.daily_cost` and only ever grows
//! until `reset()`. Reaching the budget exactly counts as crossing it.

use std::sync::Arc;

use log::{debug, info};

use crate::domain::{LoopState, PauseReason};
use crate::error::{GovernorError, Result};
use crate::escalation::EscalationChannel;
use crate::storage::StateStore;

/// Result of adding spend.
#[derive(Debug, Clone, PartialEq)]
pub struct CostOutcome {
    /// Total after this addition
    pub total: f64,
    pub paused: bool,
    /// Set when this addition reached the budget
    pub reason: Option<PauseReason>,
}

pub struct CostGovernor {
    store: Arc<dyn StateStore>,
    escalation: Arc<dyn EscalationChannel>,
    budget: f64,
}

impl CostGovernor {
    pub fn new(store: Arc<dyn StateStore>, escalation: Arc<dyn EscalationChannel>, budget: f64) -> Self {
        Self {
            store,
            escalation,
            budget,
        }
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Add spend and pause the loop if the total reaches the budget.
    pub fn add(&self, amount: f64) -> Result<CostOutcome> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(GovernorError::InvalidAmount(format!(
                "cost must be a non-negative number, got {}",
                amount
            )));
        }

        let mut state = self.store.get()?;
        let total = state.metrics.daily_cost + amount;
        state.metrics.daily_cost = total;
        debug!("Cost +{:.4} -> {:.4} of {:.2}", amount, total, self.budget);

        let reason = if total >= self.budget {
            state.paused = true;
            let reason = PauseReason::BudgetReached {
                budget: self.budget,
                total,
            };
            info!("Pausing loop: {}", reason);
            self.escalation.write(&reason.to_string())?;
            Some(reason)
        } else {
            None
        };
        self.store.put(&state)?;

        Ok(CostOutcome {
            total,
            paused: state.paused,
            reason,
        })
    }

    /// Current total. Does not write.
    pub fn get(&self) -> Result<f64> {
        Ok(self.store.get()?.metrics.daily_cost)
    }

    /// Budget left before the loop pauses, never negative.
    pub fn remaining(&self) -> Result<f64> {
        Ok((self.budget - self.get()?).max(0.0))
    }

    /// Zero the total, lift the pause and withdraw the notice.
    pub fn reset(&self) -> Result<LoopState> {
        let mut state = self.store.get()?;
        state.metrics.daily_cost = 0.0;
        state.paused = false;
        self.store.put(&state)?;
        self.escalation.clear()?;
        info!("Cost reset, loop unpaused");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::MemoryNotice;
    use crate::storage::MemoryStateStore;

    fn governor(budget: f64) -> (Arc<MemoryStateStore>, Arc<MemoryNotice>, CostGovernor) {
        let store = Arc::new(MemoryStateStore::new());
        let notice = Arc::new(MemoryNotice::new());
        let governor = CostGovernor::new(store.clone(), notice.clone(), budget);
        (store, notice, governor)
    }

    #[test]
    fn test_add_accumulates() {
        let (_store, _notice, governor) = governor(10.0);
        governor.add(1.5).unwrap();
        let outcome = governor.add(2.0).unwrap();
        assert_eq!(outcome.total, 3.5);
        assert!(!outcome.paused);
        assert_eq!(governor.get().unwrap(), 3.5);
    }

    #[test]
    fn test_budget_scenario() {
        let (store, notice, governor) = governor(5.0);
        governor.add(2.40).unwrap();
        let outcome = governor.add(2.40).unwrap();
        assert!((outcome.total - 4.80).abs() < 1e-9);
        assert!(!outcome.paused);
        assert!(!notice.exists().unwrap());

        let outcome = governor.add(0.30).unwrap();
        assert!(outcome.total >= 5.0);
        assert!(outcome.paused);
        assert!(store.get().unwrap().paused);
        assert!(notice.read().unwrap().unwrap().contains("$5.00"));
    }

    #[test]
    fn test_exact_budget_triggers() {
        let (_store, _notice, governor) = governor(5.0);
        governor.add(2.5).unwrap();
        let outcome = governor.add(2.5).unwrap();
        assert_eq!(outcome.total, 5.0);
        assert!(outcome.paused);
        assert!(matches!(outcome.reason, Some(PauseReason::BudgetReached { .. })));
    }

    #[test]
    fn test_below_budget_stays_unpaused() {
        let (_store, _notice, governor) = governor(5.0);
        let outcome = governor.add(4.99).unwrap();
        assert!(!outcome.paused);
        assert!(outcome.reason.is_none());
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let (store, _notice, governor) = governor(5.0);
        governor.add(1.0).unwrap();
        let before = store.get().unwrap();

        assert!(matches!(governor.add(-0.01), Err(GovernorError::InvalidAmount(_))));
        assert!(matches!(governor.add(f64::NAN), Err(GovernorError::InvalidAmount(_))));
        assert!(matches!(governor.add(f64::INFINITY), Err(GovernorError::InvalidAmount(_))));
        assert_eq!(store.get().unwrap(), before);
    }

    #[test]
    fn test_total_non_decreasing_then_zero_after_reset() {
        let (_store, notice, governor) = governor(3.0);
        let mut last = 0.0;
        for amount in [0.5, 0.0, 1.25, 2.0, 0.75] {
            let total = governor.add(amount).unwrap().total;
            assert!(total >= last);
            last = total;
        }
        assert!(notice.exists().unwrap());

        let state = governor.reset().unwrap();
        assert_eq!(state.metrics.daily_cost, 0.0);
        assert!(!state.paused);
        assert_eq!(governor.get().unwrap(), 0.0);
        assert!(!notice.exists().unwrap());
    }

    #[test]
    fn test_reset_keeps_stuck_counters() {
        let mut initial = LoopState::default();
        initial.stuck.no_progress_count = 3;
        initial.metrics.daily_cost = 2.0;
        let store = Arc::new(MemoryStateStore::with_state(initial));
        let governor = CostGovernor::new(store.clone(), Arc::new(MemoryNotice::new()), 10.0);

        governor.reset().unwrap();
        let state = store.get().unwrap();
        assert_eq!(state.stuck.no_progress_count, 3);
        assert_eq!(state.metrics.daily_cost, 0.0);
    }

    #[test]
    fn test_remaining() {
        let (_store, _notice, governor) = governor(5.0);
        governor.add(2.0).unwrap();
        assert_eq!(governor.remaining().unwrap(), 3.0);
        governor.add(4.0).unwrap();
        assert_eq!(governor.remaining().unwrap(), 0.0);
    }

    #[test]
    fn test_get_is_pure_read() {
        let (store, _notice, governor) = governor(5.0);
        governor.add(1.0).unwrap();
        let before = store.get().unwrap();
        governor.get().unwrap();
        governor.get().unwrap();
        assert_eq!(store.get().unwrap(), before);
    }
}
