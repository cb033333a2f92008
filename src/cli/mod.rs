//! CLI module for loopguard - command-line interface and subcommands.
//!
//! The outer driver invokes one subcommand per governor operation and reads
//! the exit code.

pub mod commands;

pub use commands::Cli;
