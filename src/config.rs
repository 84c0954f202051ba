//! Settings for repository orchestration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

const CONFIG_FILE: &str = "settings.json";
const APP_DIR: &str = "gitpocket";

/// Default tracing filter when neither `RUST_LOG` nor settings provide one
pub const DEFAULT_LOG_FILTER: &str = "gitpocket=info,git2=warn";

/// How `pull` integrates the fetched upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PullStrategy {
    #[default]
    Merge,
    Rebase,
}

/// Settings applied to every repository handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Name of the single remote the orchestrators talk to
    pub remote_name: String,

    pub pull_strategy: PullStrategy,

    /// Timeout for network operations run through the workspace; `None` disables it
    pub network_timeout_secs: Option<u64>,

    /// Include untracked files when stashing
    pub stash_include_untracked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_name: "origin".to_string(),
            pull_strategy: PullStrategy::Merge,
            network_timeout_secs: Some(120),
            stash_include_untracked: false,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Platform config directory for GitPocket, if the platform has one
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR))
    }

    /// Load settings from disk, falling back to defaults when the file is absent
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to disk
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(config_dir)?;

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(config_dir.join(CONFIG_FILE), contents)?;
        Ok(())
    }

    pub fn network_timeout(&self) -> Option<Duration> {
        self.network_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
