//! JSON-file storage for the state record and the security log.
//!
//! Each file holds one whole document. Writes go to a sibling temporary file
//! which is then renamed over the target, so readers never observe a torn
//! record. Concurrent writers can still lose updates.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Serialize, de::DeserializeOwned};

use super::traits::{EventLog, StateStore};
use crate::domain::{LoopState, SecurityEvent, SecurityLog};
use crate::error::{GovernorError, Result};

/// File name of the state record inside the state directory
pub const STATE_FILE: &str = "loop_state.json";

/// File name of the security log inside the state directory
pub const SECURITY_LOG_FILE: &str = "security_log.json";

/// Read and parse a JSON document, or `None` if the file does not exist.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(GovernorError::Storage(format!("cannot read {}: {}", path.display(), e)));
        }
    };
    let parsed = serde_json::from_str(&content)
        .map_err(|e| GovernorError::Storage(format!("corrupt {}: {}", path.display(), e)))?;
    Ok(Some(parsed))
}

/// Atomically replace `path` with `contents` via a sibling temporary file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Serialize a document and atomically replace `path` with it.
fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// State store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Store at an explicit file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `loop_state.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn get(&self) -> Result<LoopState> {
        match read_document::<LoopState>(&self.path)? {
            Some(state) => {
                let cost = state.metrics.daily_cost;
                if !cost.is_finite() || cost < 0.0 {
                    return Err(GovernorError::Storage(format!(
                        "invalid daily_cost {} in {}",
                        cost,
                        self.path.display()
                    )));
                }
                debug!("Loaded loop state from {}", self.path.display());
                Ok(state)
            }
            None => {
                debug!("No loop state at {}, using defaults", self.path.display());
                Ok(LoopState::default())
            }
        }
    }

    fn put(&self, state: &LoopState) -> Result<()> {
        write_document(&self.path, state)?;
        debug!("Saved loop state to {}", self.path.display());
        Ok(())
    }
}

/// Security log backed by a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonEventLog {
    path: PathBuf,
}

impl JsonEventLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Log at `security_log.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SECURITY_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SecurityLog> {
        Ok(read_document::<SecurityLog>(&self.path)?.unwrap_or_default())
    }
}

impl EventLog for JsonEventLog {
    fn append(&self, event: &SecurityEvent) -> Result<()> {
        let mut log = self.load()?;
        log.security_events.push(event.clone());
        write_document(&self.path, &log)
    }

    fn list(&self) -> Result<Vec<SecurityEvent>> {
        Ok(self.load()?.security_events)
    }
}
