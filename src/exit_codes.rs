//! Stable exit codes for loopguard CLI commands.

/// Command succeeded; the loop may continue.
pub const OK: i32 = 0;
/// Storage failure, invalid input or other error.
pub const ERROR: i32 = 1;
/// The loop is paused and must not continue until reset.
pub const PAUSED: i32 = 3;
/// `sandbox check_path` denied the path.
pub const DENIED: i32 = 4;
