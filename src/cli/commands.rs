//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - record_iteration: feed one iteration's signals to the stuck detector
//! - reset / status / check / notice: inspect or lift the pause
//! - cost: add, get, reset spend
//! - sandbox: check_path, list_violations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// loopguard - safety governor for autonomous agent loops
#[derive(Parser, Debug)]
#[command(name = "loopguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record one iteration's outcome; exits non-zero if the loop is paused afterward
    #[command(name = "record_iteration", alias = "record-iteration")]
    RecordIteration {
        /// Output tokens produced this iteration
        #[arg(long, allow_negative_numbers = true)]
        tokens: i64,

        /// Files changed this iteration
        #[arg(long = "file_changes", alias = "file-changes", allow_negative_numbers = true)]
        file_changes: i64,

        /// Error text if the iteration failed
        #[arg(long)]
        error: Option<String>,
    },

    /// Zero stuck counters, lift the pause and remove the escalation notice
    Reset,

    /// Print the current loop state
    Status {
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },

    /// Exit non-zero if the loop is paused
    Check,

    /// Print the escalation notice, if any
    Notice,

    /// Cost governor commands
    Cost {
        #[command(subcommand)]
        command: CostCommands,
    },

    /// Sandbox guard commands
    Sandbox {
        #[command(subcommand)]
        command: SandboxCommands,
    },
}

/// Cost governor subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CostCommands {
    /// Add spend to the running total
    Add {
        /// Amount to add
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Show the running total and remaining budget
    Get,

    /// Zero the total, lift the pause and remove the escalation notice
    Reset,
}

/// Sandbox guard subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SandboxCommands {
    /// Check a path against the containment root
    #[command(name = "check_path", alias = "check-path")]
    CheckPath {
        /// Path the agent is about to touch
        path: PathBuf,
    },

    /// List recorded sandbox violations
    #[command(name = "list_violations", alias = "list-violations")]
    ListViolations,
}
