//! Runner configuration
//!
//! The configuration is a TOML file with three sections: `[storage]` for
//! the folder layout, `[watcher]` for the polling loop, and `[engine]`
//! for the external collaborator commands. Every field has a default so a
//! missing file is replaced with a usable one on first start.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod defaults;

use defaults::*;

fn default_notebook_path() -> PathBuf {
    PathBuf::from(DEFAULT_NOTEBOOK_PATH)
}
fn default_queue_path() -> PathBuf {
    PathBuf::from(DEFAULT_QUEUE_PATH)
}
fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}
fn default_findings_path() -> PathBuf {
    PathBuf::from(DEFAULT_FINDINGS_PATH)
}
fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
fn default_check_interval() -> String {
    DEFAULT_CHECK_INTERVAL.to_string()
}
fn default_output_granularity() -> String {
    DEFAULT_OUTPUT_GRANULARITY.to_string()
}
fn default_papermill_command() -> String {
    DEFAULT_PAPERMILL_COMMAND.to_string()
}
fn default_nbconvert_command() -> String {
    DEFAULT_NBCONVERT_COMMAND.to_string()
}

/// Folder layout for notebook runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the input notebooks referenced by descriptors
    #[serde(default = "default_notebook_path")]
    pub notebook_path: PathBuf,
    /// Folder watched for pending `*.yaml` job descriptors
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
    /// Root of the time-partitioned executed notebook store
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Store for copies of flagged results and their HTML renders
    #[serde(default = "default_findings_path")]
    pub findings_path: PathBuf,
    /// Reserved configuration folder, created but not read by the runner
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
    /// Folder for the append-only run log; stdout-only when unset
    pub log_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            notebook_path: default_notebook_path(),
            queue_path: default_queue_path(),
            output_path: default_output_path(),
            findings_path: default_findings_path(),
            config_path: default_config_path(),
            log_path: None,
        }
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Time to sleep between queue sweeps, e.g. "3s" or "1m"
    #[serde(default = "default_check_interval")]
    pub check_interval: String,
    /// Time division for output folders: h, d, m or y
    #[serde(default = "default_output_granularity")]
    pub output_granularity: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            output_granularity: default_output_granularity(),
        }
    }
}

impl WatcherConfig {
    /// Parse the configured sweep interval
    pub fn check_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.check_interval).with_context(|| {
            format!("invalid watcher.check_interval '{}'", self.check_interval)
        })
    }
}

/// External collaborator commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Notebook execution engine command
    #[serde(default = "default_papermill_command")]
    pub papermill_command: String,
    /// Notebook-to-HTML renderer command
    #[serde(default = "default_nbconvert_command")]
    pub nbconvert_command: String,
    /// External configuration file handed to notebook runs; stored and
    /// logged but not otherwise consumed by the runner
    pub external_config: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            papermill_command: default_papermill_command(),
            nbconvert_command: default_nbconvert_command(),
            external_config: None,
        }
    }
}

/// Top-level runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a TOML file, writing a default config when
    /// the file does not exist yet
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)
                .with_context(|| format!("failed to read config file {config_file}"))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file {config_file}"))
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("failed to write config file {config_file}"))?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.queue_path, PathBuf::from("./queue"));
        assert_eq!(config.watcher.check_interval, "3s");
        assert_eq!(config.engine.papermill_command, "papermill");
        assert!(config.storage.log_path.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watcher]
            check_interval = "30s"
            output_granularity = "h"
            "#,
        )
        .unwrap();
        assert_eq!(config.watcher.check_interval().unwrap(), Duration::from_secs(30));
        assert_eq!(config.watcher.output_granularity, "h");
        assert_eq!(config.storage.notebook_path, PathBuf::from("./nb"));
    }

    #[test]
    fn bad_interval_is_rejected() {
        let watcher = WatcherConfig {
            check_interval: "soon".to_string(),
            ..WatcherConfig::default()
        };
        assert!(watcher.check_interval().is_err());
    }
}
