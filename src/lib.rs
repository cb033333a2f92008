//! loopguard - a safety governor for autonomous agent loops
//!
//! Once per iteration the outer driver reports what the agent did. The
//! governor tracks stuck conditions and spend in a persisted state record,
//! pauses the loop with an escalation notice when a threshold is crossed, and
//! guards every path the agent touches against a containment root.

pub mod config;
pub mod domain;
pub mod error;
pub mod escalation;
pub mod exit_codes;
pub mod governor;
pub mod sandbox;
pub mod storage;

pub use error::{GovernorError, Result};
pub use governor::Governor;
