//! Sandbox guard: filesystem containment for every path the agent touches.
//!
//! A path is allowed when it equals or descends from the containment root
//! after lexical normalization. Where part of the path exists on disk its
//! symlinks are resolved too, and the resolved form must also be contained.
//! Every denial is appended to the security log before it is reported.

mod path;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

pub use self::path::{normalize, resolve_existing};
use crate::domain::{OUTSIDE_ROOT_REASON, SecurityEvent};
use crate::error::{GovernorError, Result};
use crate::storage::EventLog;

pub struct SandboxGuard {
    root: PathBuf,
    root_resolved: Option<PathBuf>,
    base_dir: PathBuf,
    log: Arc<dyn EventLog>,
}

impl SandboxGuard {
    /// Guard rooted at `root`; relative paths resolve against the current directory.
    pub fn new(root: impl AsRef<Path>, log: Arc<dyn EventLog>) -> Result<Self> {
        let base_dir = env::current_dir()?;
        Ok(Self::with_base_dir(root, base_dir, log))
    }

    /// Guard that resolves relative paths against `base_dir`.
    pub fn with_base_dir(root: impl AsRef<Path>, base_dir: impl AsRef<Path>, log: Arc<dyn EventLog>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let root = normalize(root.as_ref(), &base_dir);
        let root_resolved = resolve_existing(&root);
        Self {
            root,
            root_resolved,
            base_dir,
            log,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn within_root(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.root)
            || self.root_resolved.as_ref().is_some_and(|root| candidate.starts_with(root))
    }

    /// Containment test without logging.
    pub fn is_allowed(&self, path: &Path) -> bool {
        let normalized = normalize(path, &self.base_dir);
        if !self.within_root(&normalized) {
            return false;
        }
        match resolve_existing(&normalized) {
            Some(real) => self.within_root(&real),
            None => true,
        }
    }

    /// Check a path the agent is about to touch.
    ///
    /// Returns the normalized path when allowed. A denied path is recorded as
    /// a `sandbox_violation` and reported as `SandboxDenied`; the caller must
    /// abort the operation.
    pub fn check_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if self.is_allowed(path) {
            debug!("Sandbox allowed {}", path.display());
            return Ok(normalize(path, &self.base_dir));
        }

        warn!("Sandbox violation: {} is outside {}", path.display(), self.root.display());
        self.log
            .append(&SecurityEvent::sandbox_violation(path.to_string_lossy()))?;
        Err(GovernorError::SandboxDenied {
            path: path.to_path_buf(),
            reason: OUTSIDE_ROOT_REASON.to_string(),
        })
    }

    /// Every recorded security event in insertion order.
    pub fn list_violations(&self) -> Result<Vec<SecurityEvent>> {
        self.log.list()
    }
}
