//! Escalation notice: the durable "needs input" artifact.
//!
//! The notice's existence is what tells the outer driver that the loop is
//! blocked. Writing replaces any previous notice; only an explicit reset
//! clears it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::info;

use crate::error::{GovernorError, Result};
use crate::storage::write_atomic;

/// File name of the notice inside the state directory
pub const NOTICE_FILE: &str = "NEEDS_INPUT.md";

const QUESTIONS: [&str; 3] = [
    "Is the current task still the right thing to work on, or should it be re-scoped?",
    "What information or decision is the agent missing to make progress?",
    "Should the loop resume unchanged once this is addressed, or with new instructions?",
];

/// Render the notice document for a pause reason.
pub fn render_notice(reason: &str, raised_at: DateTime<Utc>) -> String {
    let mut doc = String::from("# Needs Input\n\n## Reason\n\n");
    doc.push_str(reason);
    doc.push_str("\n\n## Questions\n\n");
    for (i, question) in QUESTIONS.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", i + 1, question));
    }
    doc.push_str("\n## Context\n\n");
    doc.push_str("Review the recent iteration logs before resuming. ");
    doc.push_str("The loop stays paused until the governor is reset.\n\n");
    doc.push_str(&format!("Raised at: {}\n", raised_at.to_rfc3339()));
    doc
}

/// Channel that publishes and withdraws the escalation notice.
pub trait EscalationChannel: Send + Sync {
    /// Replace any existing notice with one for `reason`.
    fn write(&self, reason: &str) -> Result<()>;

    /// Remove the notice. Clearing an absent notice is not an error.
    fn clear(&self) -> Result<()>;

    /// Current notice text, if any.
    fn read(&self) -> Result<Option<String>>;

    fn exists(&self) -> Result<bool> {
        Ok(self.read()?.is_some())
    }
}

/// Notice stored as a markdown file.
#[derive(Debug, Clone)]
pub struct NoticeFile {
    path: PathBuf,
}

impl NoticeFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Notice at `NEEDS_INPUT.md` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(NOTICE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EscalationChannel for NoticeFile {
    fn write(&self, reason: &str) -> Result<()> {
        write_atomic(&self.path, render_notice(reason, Utc::now()).as_bytes())?;
        info!("Escalation written to {}: {}", self.path.display(), reason);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Escalation cleared: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Notice held in memory.
#[derive(Debug, Default)]
pub struct MemoryNotice {
    notice: Mutex<Option<String>>,
}

impl MemoryNotice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EscalationChannel for MemoryNotice {
    fn write(&self, reason: &str) -> Result<()> {
        let mut notice = self.notice.lock().map_err(|e| GovernorError::Storage(e.to_string()))?;
        *notice = Some(render_notice(reason, Utc::now()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut notice = self.notice.lock().map_err(|e| GovernorError::Storage(e.to_string()))?;
        *notice = None;
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self
            .notice
            .lock()
            .map_err(|e| GovernorError::Storage(e.to_string()))?
            .clone())
    }
}
