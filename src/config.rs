//! Governor configuration.
//!
//! One object carries every externally supplied setting and its documented
//! default. Loading follows a fallback chain of YAML files, then environment
//! overrides are applied on top.

use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Budget used when none is configured or the configured value is unusable.
pub const DEFAULT_DAILY_BUDGET: f64 = 10.0;

/// Iterations producing fewer tokens than this (and no file changes) make no progress.
pub const DEFAULT_MIN_TOKENS: u64 = 100;

/// Consecutive no-progress iterations that pause the loop.
pub const DEFAULT_NO_PROGRESS_THRESHOLD: u32 = 5;

/// Consecutive identical errors that pause the loop.
pub const DEFAULT_SAME_ERROR_THRESHOLD: u32 = 3;

pub const ENV_DAILY_BUDGET: &str = "LOOPGUARD_DAILY_BUDGET";
pub const ENV_ROOT: &str = "LOOPGUARD_ROOT";
pub const ENV_STATE_DIR: &str = "LOOPGUARD_STATE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub log_level: Option<String>,
    /// Directory holding loop_state.json, security_log.json and NEEDS_INPUT.md
    pub state_dir: PathBuf,
    pub sandbox: SandboxConfig,
    pub budget: BudgetConfig,
    pub stuck: StuckConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Containment root; the current working directory when unset
    pub root: Option<PathBuf>,
}

impl SandboxConfig {
    /// Configured root, or the current working directory.
    pub fn resolve_root(&self) -> std::io::Result<PathBuf> {
        match &self.root {
            Some(root) if root.is_absolute() => Ok(root.clone()),
            Some(root) => Ok(env::current_dir()?.join(root)),
            None => env::current_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    #[serde(deserialize_with = "lenient_budget")]
    pub daily: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily: DEFAULT_DAILY_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    pub min_tokens: u64,
    pub no_progress_threshold: u32,
    pub same_error_threshold: u32,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            min_tokens: DEFAULT_MIN_TOKENS,
            no_progress_threshold: DEFAULT_NO_PROGRESS_THRESHOLD,
            same_error_threshold: DEFAULT_SAME_ERROR_THRESHOLD,
        }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            state_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("loopguard"),
            sandbox: SandboxConfig::default(),
            budget: BudgetConfig::default(),
            stuck: StuckConfig::default(),
        }
    }
}

/// Parse a budget value, falling back to the default when it is not a
/// finite, non-negative number.
pub fn parse_budget(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) => checked_budget(value),
        Err(_) => {
            log::warn!("Unparseable budget {:?}, using default {}", raw, DEFAULT_DAILY_BUDGET);
            DEFAULT_DAILY_BUDGET
        }
    }
}

fn checked_budget(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("Invalid budget {}, using default {}", value, DEFAULT_DAILY_BUDGET);
        DEFAULT_DAILY_BUDGET
    }
}

/// Accept a number or a numeric string; anything else becomes the default.
fn lenient_budget<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::Number(n) => match n.as_f64() {
            Some(v) => checked_budget(v),
            None => DEFAULT_DAILY_BUDGET,
        },
        serde_yaml::Value::String(s) => parse_budget(&s),
        serde_yaml::Value::Null => DEFAULT_DAILY_BUDGET,
        other => {
            log::warn!("Unusable budget {:?}, using default {}", other, DEFAULT_DAILY_BUDGET);
            DEFAULT_DAILY_BUDGET
        }
    })
}

impl GovernorConfig {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_files(config_path)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    fn load_files(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DAILY_BUDGET) {
            self.budget.daily = parse_budget(&raw);
        }
        if let Some(root) = lookup(ENV_ROOT).filter(|r| !r.is_empty()) {
            self.sandbox.root = Some(PathBuf::from(root));
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|d| !d.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
    }
}
