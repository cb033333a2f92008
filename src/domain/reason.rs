//! Why the governor paused the loop.

use std::fmt;

/// A threshold crossing that pauses the loop and raises an escalation.
#[derive(Debug, Clone, PartialEq)]
pub enum PauseReason {
    /// Consecutive iterations with negligible output and no file changes
    NoProgress { iterations: u32 },
    /// The same error text repeated back to back
    RepeatedError { error: String, repeats: u32 },
    /// Cumulative spend reached the configured budget
    BudgetReached { budget: f64, total: f64 },
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::NoProgress { iterations } => write!(
                f,
                "No progress detected for {} iterations: output was negligible and no files changed",
                iterations
            ),
            PauseReason::RepeatedError { error, repeats } => {
                write!(f, "Same error repeated {} times: {}", repeats, error)
            }
            PauseReason::BudgetReached { budget, total } => write!(
                f,
                "Daily budget of ${:.2} reached (spent ${:.2})",
                budget, total
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_message() {
        let reason = PauseReason::NoProgress { iterations: 5 };
        assert!(reason.to_string().contains("5 iterations"));
    }

    #[test]
    fn test_repeated_error_message() {
        let reason = PauseReason::RepeatedError {
            error: "API rate limit exceeded".to_string(),
            repeats: 3,
        };
        let msg = reason.to_string();
        assert!(msg.contains("API rate limit exceeded"));
        assert!(msg.contains("3 times"));
    }

    #[test]
    fn test_budget_message() {
        let reason = PauseReason::BudgetReached { budget: 5.0, total: 5.1 };
        assert_eq!(reason.to_string(), "Daily budget of $5.00 reached (spent $5.10)");
    }
}
