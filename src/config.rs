//! Configuration management for localmind.
//!
//! Configuration is loaded from `localmind.toml` in the working root, falling
//! back to `~/.config/localmind/config.toml`, then to built-in defaults.
//! Individual values can be overridden through `LOCALMIND_*` environment
//! variables so that scripts and cron jobs don't need a config file.

use crate::error::{MindError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-root configuration file.
pub const CONFIG_FILE: &str = "localmind.toml";

/// Name of the dot-directory holding localmind state under the working root.
pub const STATE_DIR: &str = ".localmind";

fn default_model() -> String {
    "qwen-lite".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_turns() -> u32 {
    10
}

fn default_keep_days() -> u32 {
    7
}

/// Top-level configuration.
///
/// All fields have serde defaults so a partial (or absent) config file is
/// valid.
///
/// # Example localmind.toml
///
/// ```toml
/// model = "qwen-lite"
/// working_root = "/home/me/projects"
/// timeout_secs = 120
/// max_turns = 10
/// keep_days = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama model name to run prompts through.
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional Ollama host override (informational; the CLI talks to the
    /// local daemon).
    #[serde(default)]
    pub host: Option<String>,

    /// Directory under which file references in debug sessions resolve.
    /// Defaults to the current directory at load time.
    #[serde(default)]
    pub working_root: Option<PathBuf>,

    /// Wall-clock budget for a single model call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum counted user turns in an interactive debug session.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Retention window for the interaction log, in days.
    #[serde(default = "default_keep_days")]
    pub keep_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            host: None,
            working_root: None,
            timeout_secs: default_timeout_secs(),
            max_turns: default_max_turns(),
            keep_days: default_keep_days(),
        }
    }
}

impl Config {
    /// Load configuration for the given working root.
    ///
    /// Resolution order: `<root>/localmind.toml`, then the user config dir,
    /// then defaults. Environment overrides are applied last.
    pub fn load(root: &Path) -> Result<Self> {
        let mut config = match Self::find_config_file(root) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| MindError::config_with_path(e.to_string(), path.clone()))?;
                toml::from_str(&raw)
                    .map_err(|e| MindError::config_with_path(e.to_string(), path))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// The working root, resolved against the launch directory.
    #[must_use]
    pub fn resolved_root(&self, launch_dir: &Path) -> PathBuf {
        match &self.working_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => launch_dir.join(root),
            None => launch_dir.to_path_buf(),
        }
    }

    /// Path of the state directory (log store, scratch) under a root.
    #[must_use]
    pub fn state_dir(root: &Path) -> PathBuf {
        root.join(STATE_DIR)
    }

    fn find_config_file(root: &Path) -> Option<PathBuf> {
        let local = root.join(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("localmind").join("config.toml");
        user.is_file().then_some(user)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("LOCALMIND_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
        if let Ok(root) = std::env::var("LOCALMIND_ROOT") {
            if !root.is_empty() {
                self.working_root = Some(PathBuf::from(root));
            }
        }
        if let Ok(secs) = std::env::var("LOCALMIND_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.timeout_secs = secs;
            }
        }
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(MindError::InvalidConfig {
                field: "model".to_string(),
                reason: "model name must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(MindError::InvalidConfig {
                field: "timeout_secs".to_string(),
                reason: "timeout must be at least 1 second".to_string(),
            });
        }
        if self.max_turns == 0 {
            return Err(MindError::InvalidConfig {
                field: "max_turns".to_string(),
                reason: "a session needs at least one turn".to_string(),
            });
        }
        Ok(())
    }
}
