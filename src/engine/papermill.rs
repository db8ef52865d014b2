//! Notebook execution engine boundary
//!
//! The production implementation shells out to the papermill CLI. The
//! parameter mapping travels as base64-encoded YAML so arbitrary values
//! survive the command line untouched.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_yaml::Mapping;
use tokio::process::Command;
use tracing::debug;

use crate::errors::ExecutionError;
use crate::jobs::types::ExecOptions;

/// How much engine stderr to keep in an error
const STDERR_TAIL: usize = 2000;

/// One engine invocation
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Path to the input notebook
    pub input_path: PathBuf,
    /// Path the executed notebook is written to
    pub output_path: PathBuf,
    /// Notebook input parameters, passed verbatim
    pub parameters: Mapping,
    /// Allow-listed engine options
    pub options: ExecOptions,
}

/// Executes a notebook with parameters, producing an executed artifact
#[async_trait]
pub trait NotebookExecutor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<(), ExecutionError>;
}

/// Papermill CLI execution engine
pub struct PapermillCli {
    command: String,
}

impl PapermillCli {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.unwrap_or_else(|| "papermill".to_string()),
        }
    }

    /// Build the papermill argument list for a request
    fn build_args(request: &ExecutionRequest) -> Result<Vec<String>, ExecutionError> {
        let mut args = vec![
            request.input_path.display().to_string(),
            request.output_path.display().to_string(),
        ];

        if !request.parameters.is_empty() {
            let yaml = serde_yaml::to_string(&request.parameters)?;
            args.push("-b".to_string());
            args.push(BASE64.encode(yaml));
        }

        let options = &request.options;
        if let Some(engine) = &options.engine_name {
            args.push("--engine".to_string());
            args.push(engine.clone());
        }
        if let Some(kernel) = &options.kernel_name {
            args.push("-k".to_string());
            args.push(kernel.clone());
        }
        if let Some(language) = &options.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }
        if let Some(interval) = options.autosave_cell_every {
            args.push("--autosave-cell-every".to_string());
            args.push(interval.to_string());
        }
        if options.request_save_on_cell_execute == Some(true) {
            args.push("--request-save-on-cell-execute".to_string());
        }
        if let Some(progress) = options.progress_bar {
            args.push(flag(progress, "--progress-bar", "--no-progress-bar"));
        }
        if let Some(log_output) = options.log_output {
            args.push(flag(log_output, "--log-output", "--no-log-output"));
        }
        if let Some(report) = options.report_mode {
            args.push(flag(report, "--report-mode", "--no-report-mode"));
        }

        Ok(args)
    }
}

fn flag(enabled: bool, on: &str, off: &str) -> String {
    if enabled { on.to_string() } else { off.to_string() }
}

#[async_trait]
impl NotebookExecutor for PapermillCli {
    async fn execute(&self, request: &ExecutionRequest) -> Result<(), ExecutionError> {
        let args = Self::build_args(request)?;
        debug!(
            "Executing notebook: {} {}",
            self.command,
            args.join(" ")
        );

        let output = Command::new(&self.command)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| ExecutionError::Spawn {
                command: self.command.clone(),
                source: err,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL);
            return Err(ExecutionError::Engine {
                code: output.status.code(),
                stderr: stderr[tail_start..].to_string(),
            });
        }

        debug!(
            "Notebook execution finished: {}",
            request.output_path.display()
        );
        Ok(())
    }
}
