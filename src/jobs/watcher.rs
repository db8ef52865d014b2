//! Queue watcher
//!
//! The top-level polling loop: list pending descriptors, run each one to
//! completion in turn, sleep, repeat. One bad descriptor never takes the
//! loop down. Ctrl-C during a sweep abandons the rest of that sweep and
//! the watcher keeps going; Ctrl-C during the between-sweep sleep stops
//! the watcher.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::fs;
use tokio::signal;
use tokio::time::sleep;
use tracing::{error, info};

use crate::context::RunnerContext;
use crate::jobs::NotebookJob;

/// Descriptor extension recognized in the queue folder
const DESCRIPTOR_EXTENSION: &str = "yaml";

/// Polls the queue folder and runs one job at a time
pub struct QueueWatcher {
    ctx: Arc<RunnerContext>,
}

impl QueueWatcher {
    pub fn new(ctx: Arc<RunnerContext>) -> Self {
        Self { ctx }
    }

    /// Run the watcher until interrupted
    pub async fn run(&self) -> Result<()> {
        info!(
            "Queue watcher started (queue: {}, interval: {:?})",
            self.ctx.queue_path.display(),
            self.ctx.check_interval
        );

        loop {
            self.sweep().await;

            info!(
                "Waiting for jobs {}s",
                self.ctx.check_interval.as_secs_f64()
            );
            tokio::select! {
                _ = sleep(self.ctx.check_interval) => {}
                _ = signal::ctrl_c() => {
                    info!("Shutdown requested, stopping queue watcher");
                    return Ok(());
                }
            }
        }
    }

    /// One pass over the queue folder
    ///
    /// Jobs are processed strictly sequentially in directory-enumeration
    /// order; per-descriptor failures are logged and isolated. An
    /// interrupt abandons the remainder of the sweep.
    pub async fn sweep(&self) {
        let descriptors = match self.list_descriptors().await {
            Ok(descriptors) => descriptors,
            Err(err) => {
                error!(
                    "Failed to list queue folder {}: {}",
                    self.ctx.queue_path.display(),
                    err
                );
                return;
            }
        };

        for job_file in descriptors {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Shutdown requested, aborting sweep");
                    break;
                }
                () = self.process_descriptor(&job_file) => {}
            }
        }
    }

    /// Construct and run one job, isolating its failures
    async fn process_descriptor(&self, job_file: &Path) {
        info!("Job descriptor found: {}", job_file.display());
        match NotebookJob::new(self.ctx.clone(), job_file).await {
            Ok(mut job) => {
                let job_id = job.job_id();
                let notebook = job.input_notebook().to_string();
                match job.run().await {
                    Ok(()) => info!(job_id = %job_id, "Job complete"),
                    Err(err) => {
                        error!(
                            job_id = %job_id,
                            notebook = %notebook,
                            "Exception while running job: {}",
                            err
                        );
                    }
                }
            }
            Err(err) => {
                error!(
                    "Failed to construct job for {}: {}",
                    job_file.display(),
                    err
                );
            }
        }
    }

    /// List pending descriptors: regular `*.yaml` files, non-recursive,
    /// in whatever order the directory yields them
    async fn list_descriptors(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut descriptors = Vec::new();
        let mut entries = fs::read_dir(&self.ctx.queue_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(OsStr::to_str) != Some(DESCRIPTOR_EXTENSION) {
                continue;
            }
            // Regular files only; tolerates in-progress writes showing up
            // as odd entries and symlink clutter.
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => descriptors.push(path),
                _ => {}
            }
        }
        Ok(descriptors)
    }
}
