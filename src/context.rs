//! Shared runner context
//!
//! Everything a job needs (folder layout, partition granularity, the
//! engine and renderer handles) is resolved once at startup and threaded
//! through the watcher and each job explicitly. There is no ambient
//! global configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{HtmlRenderer, NbConvertCli, NotebookExecutor, PapermillCli};
use crate::jobs::output_path::PartitionGranularity;

/// Execution context shared by the watcher and every job it runs
pub struct RunnerContext {
    /// Root of the input notebooks
    pub notebook_path: PathBuf,
    /// Folder watched for pending descriptors
    pub queue_path: PathBuf,
    /// Root of the time-partitioned output store
    pub output_path: PathBuf,
    /// Store for flagged results
    pub findings_path: PathBuf,
    /// Output partition granularity; `None` means full y/m/d/h nesting
    pub granularity: Option<PartitionGranularity>,
    /// Sleep between queue sweeps
    pub check_interval: Duration,
    /// Notebook execution engine
    pub executor: Arc<dyn NotebookExecutor>,
    /// Findings HTML renderer
    pub renderer: Arc<dyn HtmlRenderer>,
}

impl RunnerContext {
    /// Build the production context from configuration
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let granularity = PartitionGranularity::from_code(&config.watcher.output_granularity);
        if granularity.is_none() {
            warn!(
                "Unrecognized output granularity '{}', using full y/m/d/h nesting",
                config.watcher.output_granularity
            );
        }
        if let Some(external_config) = &config.engine.external_config {
            info!(
                "External engine configuration: {}",
                external_config.display()
            );
        }

        Ok(Arc::new(Self {
            notebook_path: config.storage.notebook_path.clone(),
            queue_path: config.storage.queue_path.clone(),
            output_path: config.storage.output_path.clone(),
            findings_path: config.storage.findings_path.clone(),
            granularity,
            check_interval: config.watcher.check_interval()?,
            executor: Arc::new(PapermillCli::new(Some(
                config.engine.papermill_command.clone(),
            ))),
            renderer: Arc::new(NbConvertCli::new(Some(
                config.engine.nbconvert_command.clone(),
            ))),
        }))
    }
}
