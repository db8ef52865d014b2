//! One job's lifecycle
//!
//! Construction claims the descriptor, parses it and validates the
//! parameters; `run` executes the notebook, inspects the artifact for
//! findings and archives the descriptor. A failure at any point leaves
//! the claimed working file in place as the durable failure record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::context::RunnerContext;
use crate::engine::ExecutionRequest;
use crate::errors::JobError;
use crate::jobs::findings::FindingsDetector;
use crate::jobs::types::NotebookParams;
use crate::jobs::{descriptor, output_path, validator};

/// Suffix marking a successfully archived descriptor
const COMPLETED_SUFFIX: &str = "job";

pub struct NotebookJob {
    ctx: Arc<RunnerContext>,
    job_id: Uuid,
    start_time: DateTime<Utc>,
    output_dir: PathBuf,
    params: NotebookParams,
}

impl std::fmt::Debug for NotebookJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotebookJob")
            .field("job_id", &self.job_id)
            .field("start_time", &self.start_time)
            .field("output_dir", &self.output_dir)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl NotebookJob {
    /// Claim a descriptor and prepare it for execution
    ///
    /// Claiming, parsing and validation are construction effects: a
    /// descriptor that fails any of them never produces a job, and the
    /// watcher logs the construction error.
    pub async fn new(ctx: Arc<RunnerContext>, job_file: &Path) -> Result<Self, JobError> {
        let job_id = Uuid::new_v4();
        let start_time = Utc::now();
        let output_dir =
            output_path::resolve(&ctx.output_path, start_time, ctx.granularity).await?;

        let claimed = descriptor::claim_and_parse(job_file, job_id).await?;
        validator::validate(&claimed, &ctx.notebook_path)?;
        let params = NotebookParams::from_claimed(claimed, job_id)?;

        Ok(Self {
            ctx,
            job_id,
            start_time,
            output_dir,
            params,
        })
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Name of the notebook to execute, relative to the notebook root
    pub fn input_notebook(&self) -> &str {
        self.params.notebook()
    }

    /// Full path of the notebook to execute
    pub fn input_file_path(&self) -> PathBuf {
        self.ctx.notebook_path.join(self.input_notebook())
    }

    /// Full path of the executed notebook artifact
    pub fn output_file_path(&self) -> PathBuf {
        self.output_dir.join(self.output_notebook())
    }

    /// Output artifact file name
    pub fn output_notebook(&self) -> String {
        format!("{}.ipynb", self.output_stem())
    }

    /// Output name without extension: source stem, identifier, start time
    fn output_stem(&self) -> String {
        let notebook = self.input_notebook();
        let stem = Path::new(notebook)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(notebook);
        format!("{}-{}-{}", stem, self.params.identifier, self.job_time())
    }

    /// Start time formatted for filename compatibility
    fn job_time(&self) -> String {
        self.start_time
            .to_rfc3339()
            .replace([':', '.'], "-")
    }

    /// Run the job: execute, inspect for findings, archive the descriptor
    pub async fn run(&mut self) -> Result<(), JobError> {
        info!(
            job_id = %self.job_id,
            "Job run started: {} ({})",
            self.input_notebook(),
            self.output_notebook()
        );

        let request = ExecutionRequest {
            input_path: self.input_file_path(),
            output_path: self.output_file_path(),
            parameters: self.params.papermill.clone(),
            options: self.params.exec.options.clone(),
        };
        self.ctx.executor.execute(&request).await?;

        let detector = FindingsDetector::new(
            self.ctx.findings_path.clone(),
            self.ctx.renderer.clone(),
        );
        detector
            .inspect(&request.output_path, &self.output_notebook())
            .await?;

        // Success is recorded by renaming the claimed working file to a
        // completed marker named after the output artifact.
        let completed = self
            .params
            .working_file
            .with_file_name(format!("{}.{COMPLETED_SUFFIX}", self.output_stem()));
        fs::rename(&self.params.working_file, &completed).await?;

        info!(
            job_id = %self.job_id,
            "Job run complete: {} ({})",
            self.input_notebook(),
            self.output_notebook()
        );
        Ok(())
    }
}
